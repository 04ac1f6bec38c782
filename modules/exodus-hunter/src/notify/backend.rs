use async_trait::async_trait;

use exodus_common::LinkButton;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    /// Telegram's HTML subset. Callers escape interpolated text.
    Html,
}

/// One message as handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub format: TextFormat,
    pub button: Option<LinkButton>,
}

impl OutboundMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
            button: None,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Html,
            button: None,
        }
    }

    pub fn with_button(mut self, button: Option<LinkButton>) -> Self {
        self.button = button;
        self
    }
}

/// Pluggable chat transport used by both the lead notifier and the admin log.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver `message` to a single chat. One attempt, no retry.
    async fn send(&self, chat_id: &str, message: &OutboundMessage) -> anyhow::Result<()>;
}
