use anyhow::Result;
use tracing::debug;

use super::types::*;
use crate::error::AiError;
use crate::util::truncate_to_char_boundary;

pub(crate) const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

pub(crate) struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(model = %request.model, "Ollama generate request");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(AiError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status,
                body: truncate_to_char_boundary(&error_text, 500).to_string(),
            }
            .into());
        }

        Ok(response.json().await.map_err(AiError::from)?)
    }
}
