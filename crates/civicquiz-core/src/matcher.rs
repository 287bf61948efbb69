//! Deterministic answer matching.
//!
//! Used when no semantic evaluator is configured and whenever the semantic
//! call fails. Matching is deliberately loose: after trimming and lowercasing,
//! an answer is accepted if it equals an acceptable answer or either string
//! contains the other.

use crate::model::EvaluationResult;

pub const CORRECT_FEEDBACK: &str = "Correct! Your answer matches one of the acceptable responses.";
pub const INCORRECT_FEEDBACK: &str = "Incorrect. Please review the acceptable answers.";

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Returns the first acceptable answer the user's answer matches, if any.
pub fn find_match<'a>(acceptable_answers: &'a [String], user_answer: &str) -> Option<&'a str> {
    let user = normalize(user_answer);

    acceptable_answers
        .iter()
        .find(|candidate| {
            let candidate = normalize(candidate);
            user == candidate || user.contains(&candidate) || candidate.contains(&user)
        })
        .map(String::as_str)
}

/// Grade an answer by string matching alone.
pub fn evaluate_deterministic(acceptable_answers: &[String], user_answer: &str) -> EvaluationResult {
    match find_match(acceptable_answers, user_answer) {
        Some(_) => EvaluationResult {
            is_correct: true,
            feedback: CORRECT_FEEDBACK.to_string(),
        },
        None => EvaluationResult {
            is_correct: false,
            feedback: INCORRECT_FEEDBACK.to_string(),
        },
    }
}
