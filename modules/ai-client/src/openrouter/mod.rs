mod client;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::AiError;
use crate::openai::types::{ChatRequest, WireMessage};
use crate::traits::{ChatModel, Message};

use client::OpenRouterClient;

// =============================================================================
// OpenRouter
// =============================================================================

/// OpenRouter speaks the OpenAI wire format with a few attribution headers.
#[derive(Clone)]
pub struct OpenRouter {
    api_key: String,
    pub(crate) model: String,
    app_name: Option<String>,
    max_tokens: u32,
    http: reqwest::Client,
}

impl OpenRouter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            app_name: None,
            max_tokens: 1024,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn client(&self) -> OpenRouterClient {
        let mut client = OpenRouterClient::new(&self.api_key, self.http.clone());
        if let Some(ref name) = self.app_name {
            client = client.with_app_name(name);
        }
        client
    }
}

#[async_trait]
impl ChatModel for OpenRouter {
    fn provider(&self) -> &'static str {
        "openrouter"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .messages(messages.iter().map(WireMessage::from).collect())
            .max_tokens(self.max_tokens)
            .temperature(0.0);

        let response = self.client().chat(&request).await?;

        response
            .into_text()
            .ok_or_else(|| anyhow!(AiError::EmptyResponse("OpenRouter")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribution_is_optional() {
        let router = OpenRouter::new("key", "meta-llama/llama-3.1-8b-instruct")
            .with_app_name("exodus");
        assert_eq!(router.app_name.as_deref(), Some("exodus"));
        assert_eq!(router.model(), "meta-llama/llama-3.1-8b-instruct");
    }
}
