// Lead delivery and the admin status stream.
//
// Leads fan out to every recipient concurrently; one recipient failing never
// blocks or rolls back the others. The admin log shares only the transport
// trait with the lead path.

pub mod admin_log;
pub mod backend;
pub mod noop;
pub mod render;
pub mod telegram;

pub use admin_log::AdminLog;
pub use backend::{MessageSender, OutboundMessage, TextFormat};
pub use noop::NoopSender;
pub use render::render_lead;
pub use self::telegram::TelegramSender;

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use exodus_common::{DeliveryResult, Lead, NotificationRecord};

pub struct Notifier {
    sender: Arc<dyn MessageSender>,
    recipients: Vec<String>,
}

impl Notifier {
    pub fn new(sender: Arc<dyn MessageSender>, recipients: Vec<String>) -> Self {
        Self { sender, recipients }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn render(&self, lead: &Lead) -> NotificationRecord {
        render_lead(lead, &self.recipients)
    }

    /// Send `record` to each of its recipients. Returns one result per
    /// recipient, in recipient order.
    pub async fn deliver(&self, record: &NotificationRecord) -> Vec<DeliveryResult> {
        let message = OutboundMessage::html(record.text.as_str()).with_button(record.button.clone());
        let message = &message;

        let sends = record.recipients.iter().map(|recipient| async move {
            let outcome = match self.sender.send(recipient, message).await {
                Ok(()) => {
                    debug!(recipient = recipient.as_str(), "lead delivered");
                    Ok(())
                }
                Err(e) => {
                    warn!(recipient = recipient.as_str(), error = %e, "lead delivery failed");
                    Err(format!("{e:#}"))
                }
            };
            DeliveryResult {
                recipient: recipient.clone(),
                outcome,
            }
        });

        join_all(sends).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{feed_item, RecordingSender};
    use exodus_common::{LeadDetail, Verdict};

    fn lead() -> Lead {
        Lead {
            item: feed_item("t3_a"),
            detail: LeadDetail::Scored(Verdict {
                score: 90.0,
                rationale: "r".into(),
                pitch: "p".into(),
            }),
        }
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_block_others() {
        let sender = Arc::new(RecordingSender::failing_for(&["bad"]));
        let notifier = Notifier::new(
            sender.clone(),
            vec!["a".into(), "bad".into(), "c".into()],
        );

        let results = notifier.deliver(&notifier.render(&lead())).await;

        let outcomes: Vec<(&str, bool)> = results
            .iter()
            .map(|r| (r.recipient.as_str(), r.is_ok()))
            .collect();
        assert_eq!(outcomes, vec![("a", true), ("bad", false), ("c", true)]);

        let mut delivered: Vec<String> = sender.sent().into_iter().map(|(to, _)| to).collect();
        delivered.sort();
        assert_eq!(delivered, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn messages_are_html_with_button() {
        let sender = Arc::new(RecordingSender::new());
        let notifier = Notifier::new(sender.clone(), vec!["a".into()]);

        notifier.deliver(&notifier.render(&lead())).await;

        let sent = sender.sent();
        assert_eq!(sent[0].1.format, TextFormat::Html);
        assert!(sent[0].1.button.is_some());
    }
}
