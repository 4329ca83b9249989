//! LLM integration: the provider trait and the chat-completions client.

mod openai;
mod provider;

pub use openai::{OpenAiChatProvider, SamplingParams};
pub use provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Create the configured LLM provider.
pub fn create_llm_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    tracing::info!(model = %config.model, "using OpenAI-compatible chat completions API");
    Ok(Arc::new(OpenAiChatProvider::new(config.clone())?))
}
