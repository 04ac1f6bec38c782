// Rule-based qualification for directory listings.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use exodus_common::{CandidateItem, Lead, LeadDetail};

use super::mx::{email_domain, MxChecker};
use super::{Qualification, Qualifier};
use crate::notify::AdminLog;
use crate::sources::EmailFinder;

fn zip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\d{5}\b").expect("Invalid zip regex"))
}

/// First five-digit group in an address, or `N/A`.
pub fn extract_zip(address: &str) -> String {
    zip_pattern()
        .find(address)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Structured-field checks. Returns the rejection reason, if any.
///
/// A listing qualifies when it has no website, has a phone number and is
/// rated at least `min_rating`. A missing rating never qualifies.
pub fn passes_rules(item: &CandidateItem, min_rating: f64) -> Result<(), String> {
    let Some(fields) = item.business() else {
        return Err("not a business listing".into());
    };

    if fields.website.is_some() {
        return Err("already has a website".into());
    }
    if fields.phone.as_deref().map_or(true, |p| p.trim().is_empty()) {
        return Err("no phone number".into());
    }
    match fields.rating {
        Some(rating) if rating >= min_rating => Ok(()),
        Some(rating) => Err(format!("rating {rating:.1} below {min_rating:.1}")),
        None => Err("no rating".into()),
    }
}

pub struct RuleQualifier {
    min_rating: f64,
    emails: Arc<dyn EmailFinder>,
    mx: Arc<dyn MxChecker>,
    admin: AdminLog,
}

impl RuleQualifier {
    pub fn new(min_rating: f64, emails: Arc<dyn EmailFinder>, mx: Arc<dyn MxChecker>) -> Self {
        Self {
            min_rating,
            emails,
            mx,
            admin: AdminLog::disabled(),
        }
    }

    pub fn with_admin_log(mut self, admin: AdminLog) -> Self {
        self.admin = admin;
        self
    }
}

#[async_trait]
impl Qualifier for RuleQualifier {
    async fn qualify(&self, item: &CandidateItem) -> Qualification {
        if let Err(reason) = passes_rules(item, self.min_rating) {
            return Qualification::Rejected(reason);
        }
        // passes_rules only admits business listings.
        let Some(fields) = item.business() else {
            return Qualification::Rejected("not a business listing".into());
        };

        self.admin
            .detail(&format!("🎯 Target Found: {}. Looking for email...", item.title))
            .await;

        let email = match self.emails.find_email(&item.title, &fields.city).await {
            Ok(Some(email)) => email,
            Ok(None) => return Qualification::Rejected("no email found".into()),
            Err(e) => {
                warn!(item = item.id.as_str(), error = %e, "email search failed");
                return Qualification::Dropped(format!("email search failed: {e:#}"));
            }
        };

        let Some(domain) = email_domain(&email) else {
            return Qualification::Rejected(format!("unusable email '{email}'"));
        };

        match self.mx.has_mx(&domain).await {
            Ok(true) => {}
            Ok(false) => return Qualification::Rejected(format!("no MX record for {domain}")),
            Err(e) => {
                warn!(domain = domain.as_str(), error = %e, "mx lookup failed");
                return Qualification::Dropped(format!("MX lookup failed for {domain}: {e:#}"));
            }
        }

        let zip = extract_zip(fields.address.as_deref().unwrap_or_default());
        debug!(item = item.id.as_str(), email = email.as_str(), "listing qualified");

        Qualification::Accepted(Lead {
            item: item.clone(),
            detail: LeadDetail::Contact { email, zip },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{business_item, RecordingSender, StaticEmails, StaticMx};

    fn qualifier(emails: StaticEmails, mx: StaticMx) -> RuleQualifier {
        RuleQualifier::new(4.0, Arc::new(emails), Arc::new(mx))
    }

    #[test]
    fn zip_from_address() {
        assert_eq!(extract_zip("1 Main St, Houston, TX 77002"), "77002");
        assert_eq!(extract_zip("Suite 123456, Austin"), "N/A");
        assert_eq!(extract_zip(""), "N/A");
    }

    #[test]
    fn rating_boundary() {
        assert!(passes_rules(&business_item("a", Some(4.0), None), 4.0).is_ok());
        let reason = passes_rules(&business_item("b", Some(3.9), None), 4.0).unwrap_err();
        assert!(reason.contains("below"));
        assert!(passes_rules(&business_item("c", None, None), 4.0).is_err());
    }

    #[test]
    fn website_always_rejected() {
        let item = business_item("a", Some(5.0), Some("https://apex.com"));
        assert_eq!(
            passes_rules(&item, 4.0).unwrap_err(),
            "already has a website"
        );
    }

    #[test]
    fn missing_phone_rejected() {
        let mut item = business_item("a", Some(4.8), None);
        if let exodus_common::ItemKind::Business(ref mut fields) = item.kind {
            fields.phone = None;
        }
        assert_eq!(passes_rules(&item, 4.0).unwrap_err(), "no phone number");
    }

    #[tokio::test]
    async fn accepted_listing_carries_email_and_zip() {
        let q = qualifier(StaticEmails::found("info@apex.com"), StaticMx::present());
        let item = business_item("a", Some(4.0), None);

        match q.qualify(&item).await {
            Qualification::Accepted(lead) => {
                assert_eq!(
                    lead.detail,
                    LeadDetail::Contact {
                        email: "info@apex.com".into(),
                        zip: "77002".into(),
                    }
                );
            }
            other => panic!("expected accepted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_email_is_rejected() {
        let q = qualifier(StaticEmails::none(), StaticMx::present());
        let result = q.qualify(&business_item("a", Some(4.5), None)).await;
        assert_eq!(result, Qualification::Rejected("no email found".into()));
    }

    #[tokio::test]
    async fn missing_mx_is_rejected() {
        let q = qualifier(StaticEmails::found("info@deadmail.com"), StaticMx::absent());
        let result = q.qualify(&business_item("a", Some(4.5), None)).await;
        assert!(matches!(result, Qualification::Rejected(reason) if reason.contains("deadmail.com")));
    }

    #[tokio::test]
    async fn mx_lookup_failure_drops_item() {
        let q = qualifier(StaticEmails::found("info@apex.com"), StaticMx::failing());
        let result = q.qualify(&business_item("a", Some(4.5), None)).await;
        assert!(matches!(result, Qualification::Dropped(_)));
    }

    #[tokio::test]
    async fn email_search_is_announced_for_listings_that_pass() {
        let sender = Arc::new(RecordingSender::new());
        let q = qualifier(StaticEmails::none(), StaticMx::present())
            .with_admin_log(AdminLog::new(sender.clone(), "42", true));

        q.qualify(&business_item("a", Some(4.5), None)).await;
        q.qualify(&business_item("b", Some(3.0), None)).await;

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].1.text,
            "📝 [LOG]: 🎯 Target Found: Apex Roofing a. Looking for email..."
        );
    }

    #[tokio::test]
    async fn rule_failure_skips_lookups() {
        let emails = StaticEmails::found("info@apex.com");
        let calls = emails.calls();
        let q = qualifier(emails, StaticMx::present());
        let result = q.qualify(&business_item("a", Some(3.9), None)).await;
        assert!(matches!(result, Qualification::Rejected(_)));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
