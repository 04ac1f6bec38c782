// MX lookups over DNS-over-HTTPS (RFC 8484 JSON flavour).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const MX_RECORD_TYPE: u16 = 15;
const DNS_NOERROR: u32 = 0;

/// Answers whether a mail domain advertises at least one MX record.
#[async_trait]
pub trait MxChecker: Send + Sync {
    async fn has_mx(&self, domain: &str) -> Result<bool>;
}

/// Domain part of an email address, lowercased.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.rsplit_once('@')?;
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() || !domain.contains('.') {
        return None;
    }
    Some(domain)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    #[serde(default)]
    data: String,
}

impl DohResponse {
    fn has_mx(&self) -> bool {
        self.status == DNS_NOERROR
            && self
                .answer
                .iter()
                .any(|a| a.record_type == MX_RECORD_TYPE && !a.data.trim().is_empty())
    }
}

pub struct DohMxChecker {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl DohMxChecker {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl MxChecker for DohMxChecker {
    async fn has_mx(&self, domain: &str) -> Result<bool> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("name", domain), ("type", "MX")])
            .header("Accept", "application/dns-json");
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await.context("DNS-over-HTTPS request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("DNS-over-HTTPS endpoint returned {status}");
        }

        let body: DohResponse = resp
            .json()
            .await
            .context("Failed to parse DNS-over-HTTPS response")?;

        let found = body.has_mx();
        debug!(domain, dns_status = body.status, found, "mx lookup complete");
        Ok(found)
    }
}
