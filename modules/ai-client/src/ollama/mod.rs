mod client;
pub(crate) mod types;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::AiError;
use crate::traits::TextCompletion;
use client::{OllamaClient, OLLAMA_DEFAULT_URL};
use types::GenerateRequest;

// =============================================================================
// Ollama (local models)
// =============================================================================

#[derive(Clone)]
pub struct Ollama {
    pub(crate) model: String,
    base_url: String,
}

impl Ollama {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: OLLAMA_DEFAULT_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextCompletion for Ollama {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = OllamaClient::new(&self.base_url).generate(&request).await?;

        response
            .text()
            .ok_or_else(|| AiError::EmptyCompletion(format!("Ollama ({})", self.model)).into())
    }
}
