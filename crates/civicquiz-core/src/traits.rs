//! Semantic evaluator trait and prompt construction.
//!
//! The trait is implemented by the `civicquiz-providers` crate.

use async_trait::async_trait;

use crate::error::EvaluatorError;
use crate::model::{EvaluationRequest, EvaluationResult};

// ---------------------------------------------------------------------------
// Semantic evaluator trait
// ---------------------------------------------------------------------------

/// A natural-language judge for free-text answers.
///
/// Implementations return `Err` for every kind of failure, including payloads
/// that do not have the exact `{isCorrect, feedback}` shape. They never fall
/// back on their own; the [`AnswerEvaluator`](crate::AnswerEvaluator) does.
#[async_trait]
pub trait SemanticEvaluator: Send + Sync {
    /// Human-readable evaluator name (e.g. "openai").
    fn name(&self) -> &str;

    /// Judge whether the user's answer is acceptable.
    async fn judge(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError>;
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// System prompt for semantic evaluation.
pub const SYSTEM_PROMPT: &str = "You are an expert evaluator for U.S. citizenship test answers. Evaluate answers based on correctness while being flexible with minor spelling errors, grammatical mistakes, and reasonable variations in wording.";

/// Build the user prompt describing one answer to grade.
pub fn build_evaluation_prompt(request: &EvaluationRequest) -> String {
    let acceptable = request
        .acceptable_answers
        .iter()
        .map(|a| format!("\"{a}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Evaluate this U.S. citizenship test answer:

Question: "{question}"
User's answer: "{user_answer}"
Acceptable answers: {acceptable}

Instructions:
1. Determine if the user's answer is correct based on the acceptable answers, ignoring case-sensitivity and minor spelling errors
2. Be flexible and allow for reasonable variations in wording, spelling, and phrasing
3. Accept synonyms and equivalent expressions
4. For numerical answers, accept both written and digit forms (e.g., "four" and "4")
5. Ignore minor grammatical errors and typos. If the core concept is correct then mark the answer as correct
6. The answer should demonstrate understanding of the core concept
7. DO NOT PENALIZE FOR MINOR SPELLING ERRORS OR GRAMMATICAL ERRORS

Respond with a JSON object with exactly two fields: "isCorrect" (boolean) and "feedback" (string)."#,
        question = request.question,
        user_answer = request.user_answer,
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Strip a surrounding markdown code fence (```json ... ```), if present.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse an evaluator's text output into an [`EvaluationResult`].
///
/// Anything but a JSON object with exactly `isCorrect: bool` and
/// `feedback: string` is rejected.
pub fn parse_evaluation_payload(content: &str) -> Result<EvaluationResult, EvaluatorError> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(EvaluatorError::EmptyResponse);
    }

    serde_json::from_str(body).map_err(|e| EvaluatorError::MalformedResponse(e.to_string()))
}
