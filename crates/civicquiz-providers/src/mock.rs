//! Mock evaluator for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use civicquiz_core::error::EvaluatorError;
use civicquiz_core::model::{EvaluationRequest, EvaluationResult};
use civicquiz_core::traits::SemanticEvaluator;

/// A mock semantic evaluator for exercising the fallback logic without real
/// API calls.
pub struct MockEvaluator {
    /// Verdict to return, or `None` to fail every call.
    verdict: Option<EvaluationResult>,
    /// Artificial latency before answering.
    delay: Duration,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<EvaluationRequest>>,
}

impl MockEvaluator {
    /// Create a mock that always returns the given verdict.
    pub fn with_verdict(is_correct: bool, feedback: &str) -> Self {
        Self {
            verdict: Some(EvaluationResult {
                is_correct,
                feedback: feedback.to_string(),
            }),
            delay: Duration::ZERO,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock whose every call fails with a network error.
    pub fn failing() -> Self {
        Self {
            verdict: None,
            delay: Duration::ZERO,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Delay every answer by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Get the number of calls made to this evaluator.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this evaluator.
    pub fn last_request(&self) -> Option<EvaluationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl SemanticEvaluator for MockEvaluator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn judge(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.verdict
            .clone()
            .ok_or_else(|| EvaluatorError::NetworkError("mock evaluator is offline".into()))
    }
}
