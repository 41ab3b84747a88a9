//! Chat-completion client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ChatError;
use crate::models::ChatConfig;
use crate::utils::retry::{RetryConfig, with_retry};

/// Role of a prompt message sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// A hosted language model that completes a list of messages.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ChatError>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Client for an OpenAI-compatible `/chat/completions` API.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    retry: RetryConfig,
}

impl OpenAiChat {
    pub fn new(config: &ChatConfig, api_key: Option<String>) -> Result<Self, ChatError> {
        let api_key = api_key.ok_or(ChatError::MissingApiKey)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            retry: RetryConfig::with_retries(config.max_retries),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn complete_once(&self, messages: &[PromptMessage]) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout
                } else if e.is_connect() {
                    ChatError::ConnectionError(e.to_string())
                } else {
                    ChatError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::ServerError { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        if let Some(usage) = &chat_response.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        first_choice(chat_response)
    }
}

fn first_choice(response: ChatResponse) -> Result<String, ChatError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ChatError::InvalidResponse("response has no choices".to_string()))
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ChatError> {
        let started = std::time::Instant::now();
        let answer =
            with_retry(&self.retry, "chat completion", || self.complete_once(messages)).await?;
        tracing::info!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis() as u64,
            answer_len = answer.len(),
            "chat completion finished"
        );
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        assert!(matches!(
            OpenAiChat::new(&ChatConfig::default(), None),
            Err(ChatError::MissingApiKey)
        ));
    }

    #[test]
    fn test_max_retries_allows_that_many_retries() {
        let config = ChatConfig {
            max_retries: 3,
            ..Default::default()
        };
        let client = OpenAiChat::new(&config, Some("sk-test".to_string())).unwrap();
        assert_eq!(client.retry.max_attempts, 4);
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![PromptMessage::system("ctx"), PromptMessage::user("hi")];
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            temperature: 0.7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["model"], "gpt-3.5-turbo");
    }

    #[test]
    fn test_first_choice_trims_content() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  He was great.\n"}}],"usage":{"prompt_tokens":10,"completion_tokens":4,"total_tokens":14}}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(first_choice(response).unwrap(), "He was great.");
    }

    #[test]
    fn test_first_choice_empty() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            first_choice(response),
            Err(ChatError::InvalidResponse(_))
        ));
    }
}
