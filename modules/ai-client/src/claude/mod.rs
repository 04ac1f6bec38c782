mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::AiError;
use crate::traits::{ChatModel, Message, MessageRole};

use client::ClaudeClient;
use types::*;

// =============================================================================
// Claude
// =============================================================================

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    max_tokens: u32,
    http: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            max_tokens: 1024,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn client(&self) -> ClaudeClient {
        let client = ClaudeClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    /// Claude takes the system prompt as a top-level field, so system
    /// messages are merged into it in order.
    pub(crate) fn build_request(&self, messages: &[Message]) -> ChatRequest {
        let mut request = ChatRequest::new(&self.model)
            .max_tokens(self.max_tokens)
            .temperature(0.0);

        for msg in messages {
            request = match msg.role {
                MessageRole::System => {
                    let combined = match request.system.take() {
                        Some(existing) if !existing.is_empty() => {
                            format!("{}\n\n{}", existing, msg.content)
                        }
                        _ => msg.content.clone(),
                    };
                    request.system(combined)
                }
                MessageRole::User => request.message(WireMessage::user(&msg.content)),
                MessageRole::Assistant => request.message(WireMessage::assistant(&msg.content)),
            };
        }

        request
    }
}

#[async_trait]
impl ChatModel for Claude {
    fn provider(&self) -> &'static str {
        "claude"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let request = self.build_request(&messages);
        let response = self.client().chat(&request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!(AiError::EmptyResponse("Claude")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_messages_merge_into_top_level_field() {
        let claude = Claude::new("key", "claude-3-5-haiku-latest");
        let request = claude.build_request(&[
            Message::system("first"),
            Message::system("second"),
            Message::user("question"),
        ]);
        assert_eq!(request.system.as_deref(), Some("first\n\nsecond"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
    }

    #[test]
    fn request_carries_token_limit() {
        let claude = Claude::new("key", "claude-3-5-haiku-latest").with_max_tokens(300);
        let request = claude.build_request(&[Message::user("q")]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 300);
        assert!(json.get("system").is_none());
    }
}
