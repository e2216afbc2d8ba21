mod client;
pub(crate) mod types;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::AiError;
use crate::traits::{Message, TextCompletion};
use client::OpenAiClient;
use types::{ChatRequest, WireMessage};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 500;

// =============================================================================
// OpenAi
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    temperature: f32,
    max_tokens: u32,
    base_url: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub(crate) fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    /// Chat completion over an explicit message list.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AiError::Config("OpenAI API key is empty".to_string()).into());
        }

        let mut request = ChatRequest::new(&self.model)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);
        for message in messages {
            request = request.message(WireMessage::from(message));
        }

        let response = self.client().chat(&request).await?;

        response
            .text()
            .ok_or_else(|| AiError::EmptyCompletion(format!("OpenAI ({})", self.model)).into())
    }
}

#[async_trait]
impl TextCompletion for OpenAi {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(&[Message::user(prompt)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "gpt-3.5-turbo");
        assert_eq!(ai.model, "gpt-3.5-turbo");
        assert_eq!(ai.api_key, "sk-test");
        assert_eq!(ai.temperature, 0.7);
        assert_eq!(ai.max_tokens, 500);
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("sk-test", "gpt-4o").with_base_url("https://custom.api.com");
        assert_eq!(ai.base_url, Some("https://custom.api.com".to_string()));
    }

    #[tokio::test]
    async fn empty_key_fails_without_network() {
        let ai = OpenAi::new("", "gpt-3.5-turbo");
        let err = ai.complete("hello").await.unwrap_err();
        assert!(err.to_string().contains("API key is empty"));
    }
}
