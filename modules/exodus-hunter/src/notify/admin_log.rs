use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::backend::{MessageSender, OutboundMessage};
use super::noop::NoopSender;

const LOG_PREFIX: &str = "📝 [LOG]: ";

/// Status stream mirrored to the operator's chat.
///
/// Every line goes through `tracing` first. The chat copy is best-effort: a
/// failed mirror is logged and swallowed so it can never stall a cycle.
#[derive(Clone)]
pub struct AdminLog {
    sender: Arc<dyn MessageSender>,
    chat_id: String,
    verbose: bool,
}

impl AdminLog {
    pub fn new(sender: Arc<dyn MessageSender>, chat_id: impl Into<String>, verbose: bool) -> Self {
        Self {
            sender,
            chat_id: chat_id.into(),
            verbose,
        }
    }

    /// Tracing only; nothing reaches a chat.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopSender), "", false)
    }

    /// Lifecycle and per-cycle status lines. Always mirrored.
    pub async fn event(&self, text: &str) {
        info!(target: "exodus::admin", "{text}");
        self.mirror(text).await;
    }

    /// Per-item chatter (skips, rejections). Mirrored only when verbose.
    pub async fn detail(&self, text: &str) {
        debug!(target: "exodus::admin", "{text}");
        if self.verbose {
            self.mirror(text).await;
        }
    }

    pub async fn error(&self, text: &str) {
        error!(target: "exodus::admin", "{text}");
        self.mirror(&format!("🚨 [SYSTEM ERROR]: {text}")).await;
    }

    async fn mirror(&self, text: &str) {
        let message = OutboundMessage::plain(format!("{LOG_PREFIX}{text}"));
        if let Err(e) = self.sender.send(&self.chat_id, &message).await {
            warn!(error = %e, "Failed to mirror log line to admin chat");
        }
    }
}
