mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::AiError;
use crate::traits::{ChatModel, Message};

use client::OpenAiClient;

// =============================================================================
// OpenAi
// =============================================================================

/// OpenAI chat completions. Any OpenAI-compatible endpoint (Groq, Together,
/// a local server) works through `with_base_url`.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    max_tokens: u32,
    http: reqwest::Client,
}

impl OpenAi {
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

    /// Swap in a preconfigured client, e.g. one with a request timeout.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    pub(crate) fn build_request(&self, messages: &[Message]) -> types::ChatRequest {
        let request = types::ChatRequest::new(&self.model)
            .messages(messages.iter().map(types::WireMessage::from).collect());

        if types::uses_max_completion_tokens(&self.model) {
            request.max_completion_tokens(self.max_tokens)
        } else {
            request.max_tokens(self.max_tokens).temperature(0.0)
        }
    }
}

#[async_trait]
impl ChatModel for OpenAi {
    fn provider(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let request = self.build_request(&messages);
        let response = self.client().chat(&request).await?;

        response
            .into_text()
            .ok_or_else(|| anyhow!(AiError::EmptyResponse("OpenAI")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_new() {
        let ai = OpenAi::new("sk-test", "gpt-4o-mini");
        assert_eq!(ai.model, "gpt-4o-mini");
        assert_eq!(ai.api_key, "sk-test");
        assert_eq!(ai.provider(), "openai");
    }

    #[test]
    fn test_openai_with_base_url() {
        let ai = OpenAi::new("sk-test", "llama-3.1-8b-instant")
            .with_base_url("https://api.groq.com/openai/v1");
        assert_eq!(
            ai.base_url,
            Some("https://api.groq.com/openai/v1".to_string())
        );
    }

    #[test]
    fn chat_models_get_zero_temperature() {
        let ai = OpenAi::new("sk-test", "gpt-4o-mini");
        let request = ai.build_request(&[Message::system("s"), Message::user("u")]);
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(1024));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
    }

    #[test]
    fn reasoning_models_skip_temperature() {
        let ai = OpenAi::new("sk-test", "o3-mini").with_max_tokens(200);
        let request = ai.build_request(&[Message::user("u")]);
        assert_eq!(request.temperature, None);
        assert_eq!(request.max_completion_tokens, Some(200));
    }
}
