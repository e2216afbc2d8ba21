use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// =============================================================================
// TextCompletion Trait
// =============================================================================

/// A backend that turns a single prompt into generated text.
///
/// Implementations return an error for an empty completion so callers can
/// treat "no text" and "request failed" the same way.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}
