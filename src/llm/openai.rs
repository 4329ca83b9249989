//! OpenAI-compatible Chat Completions provider.
//!
//! One outbound call per analysis, bearer API key auth, fixed sampling
//! parameters on every request.

use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role,
};

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub seed: u64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.9,
            max_tokens: 150,
            frequency_penalty: 0.1,
            presence_penalty: 0.1,
            seed: 42,
        }
    }
}

/// Stop token closing every completion.
const STOP_SEQUENCE: &str = "END";

/// OpenAI-compatible chat completions provider.
pub struct OpenAiChatProvider {
    client: Client,
    config: LlmConfig,
    sampling: SamplingParams,
}

impl OpenAiChatProvider {
    /// Create a provider with API key auth.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            return Err(LlmError::AuthFailed {
                provider: "openai".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            config,
            sampling: SamplingParams::default(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn api_key(&self) -> String {
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
            .unwrap_or_default()
    }

    fn build_request(&self, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.into_iter().map(|m| m.into()).collect(),
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            max_tokens: self.sampling.max_tokens,
            frequency_penalty: self.sampling.frequency_penalty,
            presence_penalty: self.sampling.presence_penalty,
            stop: vec![STOP_SEQUENCE.to_string()],
            seed: self.sampling.seed,
        }
    }

    /// Send a request to the chat completions API.
    async fn send_request<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        body: &T,
    ) -> Result<R, LlmError> {
        let url = self.api_url("chat/completions");

        tracing::debug!("sending completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key()))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("completion request failed: {}", e);
                LlmError::RequestFailed {
                    provider: "openai".to_string(),
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let response_text = response.text().await.unwrap_or_default();

        tracing::debug!("completion response status: {}", status);

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(LlmError::AuthFailed {
                    provider: "openai".to_string(),
                });
            }
            if status.as_u16() == 429 {
                let retry_after = headers
                    .get("retry-after")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);

                return Err(LlmError::RateLimited {
                    provider: "openai".to_string(),
                    retry_after,
                });
            }
            return Err(LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("HTTP {}: {}", status, response_text),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| LlmError::InvalidResponse {
            provider: "openai".to_string(),
            reason: format!("JSON parse error: {e}"),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiChatProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let request = self.build_request(req.messages);
        let response: ChatCompletionResponse = self.send_request(&request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: "no choices in response".to_string(),
            })?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
        })
    }
}

// -- Wire types --

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatCompletionMessage>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    frequency_penalty: f64,
    presence_penalty: f64,
    stop: Vec<String>,
    seed: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionMessage {
    role: String,
    content: String,
}

impl From<ChatMessage> for ChatCompletionMessage {
    fn from(msg: ChatMessage) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: msg.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    usage: ChatCompletionUsage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;

    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            model: "gpt-4".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: Some(SecretString::from("sk-test")),
            language: "English".to_string(),
        }
    }

    #[test]
    fn construction_requires_an_api_key() {
        let mut config = test_config();
        config.api_key = None;
        assert!(matches!(
            OpenAiChatProvider::new(config),
            Err(LlmError::AuthFailed { .. })
        ));
    }

    #[test]
    fn message_conversion_maps_roles() {
        let msg = ChatMessage::user("Hello");
        let wire: ChatCompletionMessage = msg.into();
        assert_eq!(wire.role, "user");
        assert_eq!(wire.content, "Hello");
    }

    #[test]
    fn requests_carry_fixed_sampling_parameters() {
        let provider = OpenAiChatProvider::new(test_config()).unwrap();
        let request = provider.build_request(vec![ChatMessage::user("hi")]);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["temperature"], 0.8);
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["max_tokens"], 150);
        assert_eq!(body["frequency_penalty"], 0.1);
        assert_eq!(body["presence_penalty"], 0.1);
        assert_eq!(body["stop"][0], "END");
        assert_eq!(body["seed"], 42);
    }

    #[test]
    fn response_parsing_takes_the_first_choice() {
        let raw = r#"{
            "choices": [{"message": {"content": "use fewer clones"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 34}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("use fewer clones")
        );
        assert_eq!(parsed.usage.prompt_tokens, 12);
    }

    #[test]
    fn api_url_joins_without_duplicate_slashes() {
        let mut config = test_config();
        config.base_url = "https://api.openai.com/v1/".to_string();
        let provider = OpenAiChatProvider::new(config).unwrap();
        assert_eq!(
            provider.api_url("/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }
}
