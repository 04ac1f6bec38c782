use async_trait::async_trait;

use super::backend::{MessageSender, OutboundMessage};

/// Sender that discards everything. Used when no log bot is configured.
pub struct NoopSender;

#[async_trait]
impl MessageSender for NoopSender {
    async fn send(&self, _chat_id: &str, _message: &OutboundMessage) -> anyhow::Result<()> {
        Ok(())
    }
}
