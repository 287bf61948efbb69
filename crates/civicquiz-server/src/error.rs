//! JSON error responses.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors a handler can return to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Required fields were absent from the request body.
    MissingFields(Vec<&'static str>),
    /// A query parameter could not be interpreted.
    BadRequest(String),
    /// The request passed validation but could not be evaluated.
    EvaluationFailed(String),
    NotFound,
    MethodNotAllowed,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Missing required fields: {}", fields.join(", ")) }),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            ApiError::EvaluationFailed(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to evaluate answer", "details": details }),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "Not found" })),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Turn a handler panic into the generic 500 response.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("request handler panicked: {message}");

    ApiError::Internal.into_response()
}
