// Minimal Telegram Bot API client: just enough to push formatted messages.

use std::time::Duration;

pub mod error;
pub mod models;

pub use error::{Result, TelegramError};
pub use models::{ParseMode, SendMessageRequest, SentMessage};

use models::{ApiResponse, BotUser};
use reqwest::Client;
use serde::de::DeserializeOwned;

const API_BASE: &str = "https://api.telegram.org";

/// Telegram rejects message text above this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Numeric ids (users, groups, `-100…` channels) or `@channelusername`.
pub fn is_chat_id(identifier: &str) -> bool {
    let digits = identifier.strip_prefix('-').unwrap_or(identifier);
    let numeric = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    let username = identifier
        .strip_prefix('@')
        .is_some_and(|name| name.len() >= 5 && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    numeric || username
}

/// Escape text for `ParseMode::Html`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
}

#[derive(Debug, Clone)]
pub struct TelegramBot {
    options: TelegramOptions,
    client: Client,
}

impl TelegramBot {
    pub fn new(options: TelegramOptions) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            options,
            client,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.options.bot_token, method)
    }

    /// Check the token by asking who the bot is.
    pub async fn get_me(&self) -> Result<BotUser> {
        let resp = self.client.get(self.method_url("getMe")).send().await?;
        Self::unwrap_response(resp).await
    }

    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<SentMessage> {
        if !is_chat_id(&request.chat_id) {
            return Err(TelegramError::InvalidChatId(request.chat_id.clone()));
        }

        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(request)
            .send()
            .await?;

        let sent: SentMessage = Self::unwrap_response(resp).await?;
        tracing::debug!(chat_id = sent.chat.id, message_id = sent.message_id, "telegram: message sent");
        Ok(sent)
    }

    /// Telegram answers errors with a JSON body and a 4xx status, so the body
    /// is decoded regardless of status.
    async fn unwrap_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let body = resp.text().await?;

        let parsed: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(TelegramError::Api {
                    code: i64::from(status.as_u16()),
                    description: body,
                })
            }
            Err(e) => return Err(e.into()),
        };

        match (parsed.ok, parsed.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::Api {
                code: parsed.error_code.unwrap_or(i64::from(status.as_u16())),
                description: parsed
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_chat_id() {
        // Valid ids
        assert!(is_chat_id("123456789"));
        assert!(is_chat_id("-1001234567890"));
        assert!(is_chat_id("@exodus_leads"));

        // Invalid ids
        assert!(!is_chat_id(""));
        assert!(!is_chat_id("-"));
        assert!(!is_chat_id("12ab"));
        assert!(!is_chat_id("@abc")); // too short
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("A & B <b>"), "A &amp; B &lt;b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn send_message_request_serializes_button() {
        let request = SendMessageRequest::new("42", "<b>hi</b>")
            .parse_mode(ParseMode::Html)
            .link_button("Open", "https://example.com");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(json["reply_markup"]["inline_keyboard"][0][0]["url"], "https://example.com");
        assert!(json.get("disable_web_page_preview").is_none());
    }

    #[test]
    fn api_error_body_parses() {
        let raw = r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#;
        let parsed: ApiResponse<SentMessage> = serde_json::from_str(raw).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.error_code, Some(403));
        assert!(parsed.result.is_none());
    }

    #[test]
    fn method_url_embeds_token() {
        let bot = TelegramBot::new(TelegramOptions {
            bot_token: "123:abc".to_string(),
        });
        assert_eq!(
            bot.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}
