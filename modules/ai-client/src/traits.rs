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
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// ChatModel Trait
// =============================================================================

/// A text-generation provider that answers a conversation with free-form text.
///
/// Implementations make exactly one HTTP call per `complete` and never retry.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider label used in logs ("openai", "claude", ...).
    fn provider(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn complete(&self, messages: Vec<Message>) -> Result<String>;

    /// One system instruction plus one user turn.
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String> {
        self.complete(vec![Message::system(system), Message::user(user)])
            .await
    }
}
