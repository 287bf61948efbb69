//! Core data model types for civicquiz.
//!
//! Field names follow the JSON wire format used by the question data file and
//! the HTTP API (`answer`, `acceptableAnswers`, `isCorrect`, ...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Identifier of a question, kept in whatever JSON form the data file uses.
///
/// Any JSON number is accepted (negative and fractional included) so one
/// odd id cannot make the whole file unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    Number(Number),
    Text(String),
}

impl From<u64> for QuestionId {
    fn from(n: u64) -> Self {
        QuestionId::Number(n.into())
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Number(n) => write!(f, "{n}"),
            QuestionId::Text(s) => f.write_str(s),
        }
    }
}

/// A single practice question with its acceptable answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier.
    pub id: QuestionId,
    /// Free-form grouping label.
    pub category: String,
    /// The question text.
    pub question: String,
    /// Acceptable answers, in the order they should be tried.
    pub answer: Vec<String>,
    /// Any other fields of the record, echoed back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    pub fn new(
        id: impl Into<QuestionId>,
        category: impl Into<String>,
        question: impl Into<String>,
        answer: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            question: question.into(),
            answer,
            extra: Map::new(),
        }
    }
}

/// A request to grade one free-text answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub question: String,
    pub acceptable_answers: Vec<String>,
    pub user_answer: String,
}

impl EvaluationRequest {
    pub fn new(
        question: impl Into<String>,
        acceptable_answers: Vec<String>,
        user_answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            acceptable_answers,
            user_answer: user_answer.into(),
        }
    }
}

/// The verdict on a user's answer.
///
/// Unknown fields are rejected so that a semantic evaluator's payload is only
/// accepted when it has exactly this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvaluationResult {
    pub is_correct: bool,
    pub feedback: String,
}

/// Which evaluation path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationPath {
    Semantic,
    Deterministic,
}

impl fmt::Display for EvaluationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationPath::Semantic => f.write_str("semantic"),
            EvaluationPath::Deterministic => f.write_str("deterministic"),
        }
    }
}
