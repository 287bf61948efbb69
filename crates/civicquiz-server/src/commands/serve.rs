//! The `civicquiz serve` command.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use civicquiz_core::{AnswerEvaluator, QuestionStore};
use civicquiz_providers::config::{create_evaluator, load_config_from, load_dotenv};
use civicquiz_server::{router, AppState};

pub async fn execute(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    questions: Option<PathBuf>,
    static_dir: Option<PathBuf>,
) -> Result<()> {
    load_dotenv();

    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(questions) = questions {
        config.questions_path = questions;
    }
    if let Some(static_dir) = static_dir {
        config.static_dir = static_dir;
    }

    // Fully loaded before the listener binds.
    let store = QuestionStore::load(&config.questions_path);
    let semantic = create_evaluator(&config)?;
    let evaluator = AnswerEvaluator::new(semantic, config.evaluator_config());

    tracing::info!(
        openai_configured = evaluator.is_semantic_configured(),
        questions_loaded = store.len(),
        categories = ?store.categories(),
        "starting server"
    );

    let state = AppState::new(store, evaluator, config.questions_path.clone())
        .with_static_dir(config.static_dir.clone());
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
