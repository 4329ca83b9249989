//! Analysis orchestration: build the task, run the model once, persist the
//! result.

use std::sync::Arc;

use crate::agent;
use crate::error::AnalysisError;
use crate::history::{AnalysisHistory, HistoryStore};
use crate::llm::{CompletionRequest, LlmProvider};
use crate::logging::ExecutionTimer;

/// Runs one analysis per call; no retries, no queueing.
pub struct AnalyzerService {
    llm: Arc<dyn LlmProvider>,
    history: Arc<dyn HistoryStore>,
    language: String,
}

impl AnalyzerService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        history: Arc<dyn HistoryStore>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            history,
            language: language.into(),
        }
    }

    /// Analyze one snippet: task, model round-trip, history row, text back.
    ///
    /// Failure detail is logged here; callers only learn the failing step.
    pub async fn analyze(&self, code: &str) -> Result<String, AnalysisError> {
        let task = agent::code_improvement_task(code, &self.language);
        let request = CompletionRequest {
            messages: task.to_messages(),
        };

        let response = {
            let _timer = ExecutionTimer::start("model call");
            self.llm.complete(request).await.map_err(|e| {
                tracing::error!(model = self.llm.model_name(), "model invocation failed: {}", e);
                AnalysisError::Model
            })?
        };

        let entry = AnalysisHistory::new(code, response.content.clone());
        self.history.record(entry).await.map_err(|e| {
            tracing::error!("failed to persist analysis: {}", e);
            AnalysisError::Persistence
        })?;

        Ok(response.content)
    }
}
