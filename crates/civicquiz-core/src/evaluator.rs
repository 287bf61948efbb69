//! Two-path answer evaluator.
//!
//! Tries the configured semantic evaluator first. Any failure, including a
//! timeout, is absorbed and replaced by one deterministic evaluation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::instrument;

use crate::error::EvaluatorError;
use crate::matcher::evaluate_deterministic;
use crate::model::{EvaluationPath, EvaluationRequest, EvaluationResult};
use crate::traits::SemanticEvaluator;

/// Configuration for the answer evaluator.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Upper bound on one semantic call. Elapsing counts as a failure.
    pub semantic_timeout: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            semantic_timeout: Duration::from_secs(10),
        }
    }
}

/// Grades free-text answers.
///
/// Whether the semantic path is available is fixed at construction, so an
/// evaluation depends only on its inputs and this one choice.
#[derive(Clone)]
pub struct AnswerEvaluator {
    semantic: Option<Arc<dyn SemanticEvaluator>>,
    config: EvaluatorConfig,
}

impl AnswerEvaluator {
    pub fn new(semantic: Option<Arc<dyn SemanticEvaluator>>, config: EvaluatorConfig) -> Self {
        Self { semantic, config }
    }

    /// An evaluator that only ever uses string matching.
    pub fn deterministic() -> Self {
        Self::new(None, EvaluatorConfig::default())
    }

    pub fn is_semantic_configured(&self) -> bool {
        self.semantic.is_some()
    }

    /// Grade `user_answer` against `acceptable_answers`. Never fails.
    pub async fn evaluate(
        &self,
        question: &str,
        acceptable_answers: &[String],
        user_answer: &str,
    ) -> EvaluationResult {
        self.evaluate_with_path(question, acceptable_answers, user_answer)
            .await
            .0
    }

    /// Like [`evaluate`](Self::evaluate), also reporting which path decided.
    #[instrument(skip_all)]
    pub async fn evaluate_with_path(
        &self,
        question: &str,
        acceptable_answers: &[String],
        user_answer: &str,
    ) -> (EvaluationResult, EvaluationPath) {
        if let Some(semantic) = &self.semantic {
            let request =
                EvaluationRequest::new(question, acceptable_answers.to_vec(), user_answer);

            match self.judge(semantic.as_ref(), &request).await {
                Ok(result) => return (result, EvaluationPath::Semantic),
                Err(e) if e.is_permanent() => {
                    tracing::error!(
                        evaluator = semantic.name(),
                        "semantic evaluation failed, using string matching: {e}"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        evaluator = semantic.name(),
                        "semantic evaluation failed, using string matching: {e}"
                    );
                }
            }
        }

        (
            evaluate_deterministic(acceptable_answers, user_answer),
            EvaluationPath::Deterministic,
        )
    }

    async fn judge(
        &self,
        semantic: &dyn SemanticEvaluator,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluatorError> {
        let start = Instant::now();
        let timeout = self.config.semantic_timeout;

        let result = tokio::time::timeout(timeout, semantic.judge(request))
            .await
            .map_err(|_| EvaluatorError::Timeout(timeout.as_millis() as u64))??;

        tracing::debug!(
            evaluator = semantic.name(),
            latency_ms = start.elapsed().as_millis() as u64,
            is_correct = result.is_correct,
            "semantic evaluation complete"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for AnswerEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerEvaluator")
            .field("semantic", &self.semantic.as_ref().map(|s| s.name().to_string()))
            .field("config", &self.config)
            .finish()
    }
}
