// Qualification: decide whether a fresh candidate is worth a notification.
//
// Qualifiers never return errors. Anything that goes wrong while judging an
// item (provider outage, unparseable verdict, failed lookup) becomes
// `Qualification::Dropped`, which the worker logs and moves past.

pub mod model;
pub mod mx;
pub mod rules;

pub use model::{parse_verdict, ModelQualifier, VerdictError};
pub use mx::{email_domain, DohMxChecker, MxChecker};
pub use rules::{extract_zip, passes_rules, RuleQualifier};

use async_trait::async_trait;

use exodus_common::{CandidateItem, Lead};

#[derive(Debug, Clone, PartialEq)]
pub enum Qualification {
    Accepted(Lead),
    /// Judged and found wanting.
    Rejected(String),
    /// Could not be judged. Logged as an error, never notified.
    Dropped(String),
}

#[async_trait]
pub trait Qualifier: Send + Sync {
    async fn qualify(&self, item: &CandidateItem) -> Qualification;
}
