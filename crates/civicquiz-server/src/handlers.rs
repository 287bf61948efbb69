//! Request handlers.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use civicquiz_core::model::{EvaluationRequest, EvaluationResult, Question};

use crate::error::ApiError;
use crate::AppState;

pub const DEFAULT_QUESTION_COUNT: usize = 10;

/// Fields `/api/evaluate` requires, in the order they are reported.
const REQUIRED_EVALUATE_FIELDS: [&str; 3] = ["question", "userAnswer", "acceptableAnswers"];

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
    category: Option<String>,
    count: Option<String>,
}

pub async fn list_questions(
    State(state): State<AppState>,
    query: Result<Query<QuestionsQuery>, QueryRejection>,
) -> Result<Json<Vec<Question>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let count = match query.count.as_deref() {
        None => DEFAULT_QUESTION_COUNT,
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ApiError::BadRequest(format!("Invalid count: {raw:?}")))?,
    };

    Ok(Json(state.store.sample(count, query.category.as_deref())))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.categories())
}

/// Grade one answer.
///
/// Presence of every required field is checked before anything is
/// deserialized, so a request missing a field never reaches the evaluator.
pub async fn evaluate_answer(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EvaluationResult>, ApiError> {
    let request = parse_evaluate_body(&body)?;

    let (result, path) = state
        .evaluator
        .evaluate_with_path(
            &request.question,
            &request.acceptable_answers,
            &request.user_answer,
        )
        .await;
    tracing::info!(%path, is_correct = result.is_correct, "answer evaluated");

    Ok(Json(result))
}

fn parse_evaluate_body(body: &[u8]) -> Result<EvaluationRequest, ApiError> {
    let object = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => object,
        _ => return Err(ApiError::MissingFields(REQUIRED_EVALUATE_FIELDS.to_vec())),
    };

    let missing: Vec<&'static str> = REQUIRED_EVALUATE_FIELDS
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| {
        tracing::error!("error evaluating answer: {e}");
        ApiError::EvaluationFailed(e.to_string())
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    openai_configured: bool,
    questions_loaded: usize,
    categories: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        openai_configured: state.evaluator.is_semantic_configured(),
        questions_loaded: state.store.len(),
        categories: state.store.categories().len(),
    })
}

/// Serve the question data file as it is on disk.
pub async fn raw_questions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bytes = tokio::fs::read(&state.questions_path).await.map_err(|e| {
        tracing::warn!(
            "cannot serve {}: {e}",
            state.questions_path.display()
        );
        ApiError::NotFound
    })?;

    Ok(([(CONTENT_TYPE, "application/json")], bytes))
}

/// Serve `index.html` from the static directory at `/`.
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let path = state.static_dir.join("index.html");
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::debug!("cannot serve {}: {e}", path.display());
        ApiError::NotFound
    })?;

    Ok(([(CONTENT_TYPE, "text/html; charset=utf-8")], bytes))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_fields_missing_for_non_object_body() {
        let bodies: [&[u8]; 4] = [b"", b"not json", b"[1, 2]", b"null"];
        for body in bodies {
            match parse_evaluate_body(body) {
                Err(ApiError::MissingFields(fields)) => assert_eq!(fields.len(), 3),
                other => panic!("expected MissingFields, got {other:?}"),
            }
        }
    }

    #[test]
    fn reports_only_missing_fields() {
        let body = br#"{"question": "q", "userAnswer": "a"}"#;
        match parse_evaluate_body(body) {
            Err(ApiError::MissingFields(fields)) => assert_eq!(fields, vec!["acceptableAnswers"]),
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn wrong_field_type_is_an_evaluation_failure() {
        let body = br#"{"question": "q", "userAnswer": "a", "acceptableAnswers": 5}"#;
        assert!(matches!(
            parse_evaluate_body(body),
            Err(ApiError::EvaluationFailed(_))
        ));
    }

    #[test]
    fn complete_body_parses() {
        let body = br#"{"question": "q", "userAnswer": "a", "acceptableAnswers": ["a", "b"]}"#;
        let request = parse_evaluate_body(body).unwrap();
        assert_eq!(request.acceptable_answers.len(), 2);
    }
}
