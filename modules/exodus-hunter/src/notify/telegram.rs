use anyhow::Context;
use async_trait::async_trait;
use telegram::{ParseMode, SendMessageRequest, TelegramBot, TelegramOptions, MAX_MESSAGE_CHARS};
use tracing::debug;

use super::backend::{MessageSender, OutboundMessage, TextFormat};

/// Telegram Bot API transport.
pub struct TelegramSender {
    bot: TelegramBot,
}

impl TelegramSender {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_bot(TelegramBot::new(TelegramOptions {
            bot_token: bot_token.into(),
        }))
    }

    pub fn with_bot(bot: TelegramBot) -> Self {
        Self { bot }
    }

    /// Check the token against `getMe`. Returns the bot's username.
    pub async fn verify(&self) -> anyhow::Result<String> {
        let me = self.bot.get_me().await.context("Telegram getMe failed")?;
        Ok(me.username.unwrap_or_else(|| me.id.to_string()))
    }
}

fn build_request(chat_id: &str, message: &OutboundMessage) -> SendMessageRequest {
    let mut request = match message.format {
        TextFormat::Html => {
            SendMessageRequest::new(chat_id, message.text.as_str()).parse_mode(ParseMode::Html)
        }
        // Plain text can be cut anywhere; HTML is kept short by the renderer.
        TextFormat::Plain => SendMessageRequest::new(
            chat_id,
            message.text.chars().take(MAX_MESSAGE_CHARS).collect::<String>(),
        ),
    };

    if let Some(ref button) = message.button {
        request = request.link_button(button.text.as_str(), button.url.as_str());
    }
    request.without_preview()
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send(&self, chat_id: &str, message: &OutboundMessage) -> anyhow::Result<()> {
        let request = build_request(chat_id, message);
        let sent = self
            .bot
            .send_message(&request)
            .await
            .with_context(|| format!("Telegram sendMessage to {chat_id} failed"))?;

        debug!(chat_id, message_id = sent.message_id, "telegram message sent");
        Ok(())
    }
}
