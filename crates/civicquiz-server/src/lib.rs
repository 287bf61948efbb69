//! civicquiz-server — HTTP API for citizenship-test practice.
//!
//! Serves random question samples and categories from a read-only
//! [`QuestionStore`] and grades answers with an [`AnswerEvaluator`].

pub mod error;
pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::handler::HandlerWithoutStateExt;
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use civicquiz_core::{AnswerEvaluator, QuestionStore};

/// State shared by every request handler. Nothing in it is mutated after
/// startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<QuestionStore>,
    pub evaluator: AnswerEvaluator,
    /// File served verbatim at `/questions.json`.
    pub questions_path: PathBuf,
    /// Browser client files, served under `/static` with `index.html` at `/`.
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(store: QuestionStore, evaluator: AnswerEvaluator, questions_path: PathBuf) -> Self {
        Self {
            store: Arc::new(store),
            evaluator,
            questions_path,
            static_dir: PathBuf::from("static"),
        }
    }

    pub fn with_static_dir(mut self, static_dir: PathBuf) -> Self {
        self.static_dir = static_dir;
        self
    }
}

pub fn router(state: AppState) -> Router {
    let static_files =
        ServeDir::new(&state.static_dir).not_found_service(handlers::not_found.into_service());

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/questions", get(handlers::list_questions))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/evaluate", post(handlers::evaluate_answer))
        .route("/api/health", get(handlers::health_check))
        .route("/questions.json", get(handlers::raw_questions))
        .nest_service("/static", static_files)
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
