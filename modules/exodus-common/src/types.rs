use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// --- Work units ---

/// One query issued against a source during a cycle. Built once from
/// configuration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkUnit {
    /// A places search for one niche in one city.
    Directory { niche: String, city: String },
    /// One chunk of OR-joined feed keywords.
    FeedBatch { index: usize, keywords: Vec<String> },
}

impl WorkUnit {
    pub fn directory(niche: impl Into<String>, city: impl Into<String>) -> Self {
        WorkUnit::Directory {
            niche: niche.into(),
            city: city.into(),
        }
    }

    /// Short human label for log lines.
    pub fn label(&self) -> String {
        match self {
            WorkUnit::Directory { niche, city } => format!("{niche} in {city}"),
            WorkUnit::FeedBatch { index, keywords } => {
                format!("keyword batch #{} ({} terms)", index + 1, keywords.len())
            }
        }
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// --- Candidates ---

/// Structured fields of a business listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessFields {
    pub rating: Option<f64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    /// The city the listing was searched in.
    pub city: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Business(BusinessFields),
    FeedEntry {
        community: Option<String>,
        published: Option<DateTime<Utc>>,
    },
}

/// A normalized record fetched from a source. `id` is unique per source and
/// is the dedup key.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateItem {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub kind: ItemKind,
}

impl CandidateItem {
    pub fn business(&self) -> Option<&BusinessFields> {
        match &self.kind {
            ItemKind::Business(fields) => Some(fields),
            ItemKind::FeedEntry { .. } => None,
        }
    }
}

// --- Verdicts ---

/// Structured verdict a text-generation model must return for a feed post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    /// Suitability from 0 (irrelevant) to 100 (ideal lead).
    pub score: f64,
    /// One or two sentences explaining the score.
    #[serde(rename = "reason")]
    pub rationale: String,
    /// A short, friendly outreach message to the poster.
    pub pitch: String,
}

// --- Leads ---

#[derive(Debug, Clone, PartialEq)]
pub enum LeadDetail {
    /// Directory lead with a discovered, MX-checked email.
    Contact { email: String, zip: String },
    /// Feed lead scored by a model.
    Scored(Verdict),
}

/// A candidate that passed qualification.
#[derive(Debug, Clone, PartialEq)]
pub struct Lead {
    pub item: CandidateItem,
    pub detail: LeadDetail,
}

// --- Notifications ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub text: String,
    pub url: String,
}

/// A formatted outbound message and the recipients it must reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    /// Telegram HTML text.
    pub text: String,
    pub button: Option<LinkButton>,
    pub recipients: Vec<String>,
}

/// Outcome of delivering one notification to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub recipient: String,
    pub outcome: Result<(), String>,
}

impl DeliveryResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_unit_labels() {
        assert_eq!(
            WorkUnit::directory("Roofing", "Houston, TX").label(),
            "Roofing in Houston, TX"
        );
        let batch = WorkUnit::FeedBatch {
            index: 0,
            keywords: vec!["a".into(), "b".into()],
        };
        assert_eq!(batch.to_string(), "keyword batch #1 (2 terms)");
    }

    #[test]
    fn verdict_reads_reason_field() {
        let verdict: Verdict =
            serde_json::from_str(r#"{"score": 85, "reason": "needs a site", "pitch": "Hi!"}"#)
                .unwrap();
        assert_eq!(verdict.score, 85.0);
        assert_eq!(verdict.rationale, "needs a site");
    }

    #[test]
    fn verdict_requires_every_field() {
        assert!(serde_json::from_str::<Verdict>(r#"{"score": 85}"#).is_err());
    }
}
