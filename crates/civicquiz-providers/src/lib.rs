//! civicquiz-providers — Semantic evaluator integrations and configuration.
//!
//! Implements the `SemanticEvaluator` trait against the OpenAI chat
//! completions API, plus a mock for tests, and loads the service
//! configuration.

pub mod config;
pub mod mock;
pub mod openai;

pub use config::{create_evaluator, load_config, CivicQuizConfig, OpenAiConfig};
pub use mock::MockEvaluator;
pub use openai::OpenAiEvaluator;
