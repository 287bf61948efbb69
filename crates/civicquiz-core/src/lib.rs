//! civicquiz-core — Question store, answer matching, and evaluation.
//!
//! This crate defines the data model, the semantic evaluator trait, and the
//! two-path answer evaluator that the HTTP server builds on.

pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod model;
pub mod store;
pub mod traits;

pub use error::EvaluatorError;
pub use evaluator::{AnswerEvaluator, EvaluatorConfig};
pub use model::{EvaluationPath, EvaluationRequest, EvaluationResult, Question, QuestionId};
pub use store::QuestionStore;
