// Test mocks for the hunter pipeline.
//
// One mock per trait boundary:
// - MockSource (LeadSource): per-unit canned items, call log, optional delay
// - MockQualifier (Qualifier): fixed outcome for every item
// - RecordingSender / FailingSender (MessageSender)
// - StaticEmails (EmailFinder), StaticMx (MxChecker)
// - ScriptedModel (ChatModel): canned completion text
//
// Plus helpers for building directory and feed candidates.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_client::{ChatModel, Message};
use anyhow::{bail, Result};
use async_trait::async_trait;

use exodus_common::{
    BusinessFields, CandidateItem, ItemKind, Lead, LeadDetail, Verdict, WorkUnit,
};

use crate::notify::{MessageSender, OutboundMessage};
use crate::qualify::{MxChecker, Qualification, Qualifier};
use crate::sources::{EmailFinder, LeadSource};

// ---------------------------------------------------------------------------
// Item helpers
// ---------------------------------------------------------------------------

/// A Houston listing with a phone number and a zip in its address.
pub fn business_item(id: &str, rating: Option<f64>, website: Option<&str>) -> CandidateItem {
    CandidateItem {
        id: id.to_string(),
        title: format!("Apex Roofing {id}"),
        snippet: "Roofing contractor".to_string(),
        link: format!("https://www.google.com/maps/search/?api=1&query_place_id={id}"),
        kind: ItemKind::Business(BusinessFields {
            rating,
            phone: Some("(713) 555-0100".to_string()),
            website: website.map(str::to_string),
            address: Some("1 Main St, Houston, TX 77002".to_string()),
            city: "Houston, TX".to_string(),
        }),
    }
}

pub fn feed_item(id: &str) -> CandidateItem {
    CandidateItem {
        id: id.to_string(),
        title: format!("[Hiring] Need a website for my shop ({id})"),
        snippet: "Small bakery, budget ready, want online orders.".to_string(),
        link: format!("https://www.reddit.com/r/forhire/comments/{id}/"),
        kind: ItemKind::FeedEntry {
            community: Some("r/forhire".to_string()),
            published: None,
        },
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Canned items per work unit. Unregistered units return no items.
/// Builder pattern: `.on_unit()`, `.failing_on()`, `.with_delay()`.
#[derive(Default)]
pub struct MockSource {
    items: HashMap<String, Vec<CandidateItem>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    panics: bool,
    calls: Arc<Mutex<Vec<WorkUnit>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_unit(mut self, unit: &WorkUnit, items: Vec<CandidateItem>) -> Self {
        self.items.insert(unit.label(), items);
        self
    }

    pub fn failing_on(mut self, unit: &WorkUnit) -> Self {
        self.failing.insert(unit.label());
        self
    }

    /// Every fetch sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every fetch panics.
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Units fetched so far, in call order.
    pub fn calls(&self) -> Arc<Mutex<Vec<WorkUnit>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl LeadSource for MockSource {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<CandidateItem>> {
        if self.panics {
            panic!("MockSource: fetch panicked for {unit}");
        }
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(unit.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let label = unit.label();
        if self.failing.contains(&label) {
            bail!("MockSource: upstream error for {label}");
        }
        Ok(self.items.get(&label).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockQualifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Accept,
    Reject,
    Drop,
}

/// Gives every item the same outcome. Accepted items carry a 90-point verdict.
pub struct MockQualifier {
    outcome: Outcome,
}

impl MockQualifier {
    pub fn accept_all() -> Self {
        Self {
            outcome: Outcome::Accept,
        }
    }

    pub fn reject_all() -> Self {
        Self {
            outcome: Outcome::Reject,
        }
    }

    pub fn drop_all() -> Self {
        Self {
            outcome: Outcome::Drop,
        }
    }
}

#[async_trait]
impl Qualifier for MockQualifier {
    async fn qualify(&self, item: &CandidateItem) -> Qualification {
        match self.outcome {
            Outcome::Accept => Qualification::Accepted(Lead {
                item: item.clone(),
                detail: LeadDetail::Scored(Verdict {
                    score: 90.0,
                    rationale: "mock".to_string(),
                    pitch: "mock pitch".to_string(),
                }),
            }),
            Outcome::Reject => Qualification::Rejected("mock rejection".to_string()),
            Outcome::Drop => Qualification::Dropped("mock drop".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Senders
// ---------------------------------------------------------------------------

/// Records every successful send. Chats listed in `failing_for` error out.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, OutboundMessage)>>,
    fail_for: HashSet<String>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(chat_ids: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: chat_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<(String, OutboundMessage)> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn sent_to(&self, chat_id: &str) -> usize {
        self.sent().iter().filter(|(to, _)| to == chat_id).count()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, chat_id: &str, message: &OutboundMessage) -> Result<()> {
        if self.fail_for.contains(chat_id) {
            bail!("RecordingSender: chat {chat_id} unreachable");
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((chat_id.to_string(), message.clone()));
        Ok(())
    }
}

/// Every send fails.
pub struct FailingSender;

#[async_trait]
impl MessageSender for FailingSender {
    async fn send(&self, chat_id: &str, _message: &OutboundMessage) -> Result<()> {
        bail!("FailingSender: refusing to send to {chat_id}")
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

pub struct StaticEmails {
    email: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl StaticEmails {
    pub fn found(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn none() -> Self {
        Self {
            email: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl EmailFinder for StaticEmails {
    async fn find_email(&self, _business: &str, _city: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.email.clone())
    }
}

pub struct StaticMx {
    answer: Option<bool>,
}

impl StaticMx {
    pub fn present() -> Self {
        Self { answer: Some(true) }
    }

    pub fn absent() -> Self {
        Self {
            answer: Some(false),
        }
    }

    pub fn failing() -> Self {
        Self { answer: None }
    }
}

#[async_trait]
impl MxChecker for StaticMx {
    async fn has_mx(&self, domain: &str) -> Result<bool> {
        match self.answer {
            Some(found) => Ok(found),
            None => bail!("StaticMx: resolver timeout for {domain}"),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedModel
// ---------------------------------------------------------------------------

/// Chat model that answers every prompt with the same text, or always fails.
pub struct ScriptedModel {
    reply: Option<String>,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn provider(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(messages);
        match self.reply {
            Some(ref reply) => Ok(reply.clone()),
            None => bail!("ScriptedModel: provider returned 503"),
        }
    }
}
