// Directory search via SerpApi's Google Maps engine.
// A second, per-business web search scrapes a contact email.

use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serpapi_client::{LocalResult, SerpApiClient};
use tracing::{debug, info};

use exodus_common::{BusinessFields, CandidateItem, ItemKind, WorkUnit};

use super::{EmailFinder, LeadSource};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("Invalid email regex")
    })
}

/// First email-looking substring of `text`. No guarantee it belongs to the
/// business it was searched for.
pub fn extract_email(text: &str) -> Option<String> {
    email_pattern().find(text).map(|m| m.as_str().to_string())
}

/// Google Maps search link for a listing, pinned to the place when known.
fn maps_link(listing: &LocalResult, city: &str) -> String {
    let query = format!("{} {}", listing.title, city);
    let mut params = vec![("api", "1"), ("query", query.as_str())];
    if let Some(ref place_id) = listing.place_id {
        params.push(("query_place_id", place_id.as_str()));
    }
    url::Url::parse_with_params("https://www.google.com/maps/search/", &params)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| "https://www.google.com/maps".to_string())
}

fn into_candidate(listing: LocalResult, city: &str) -> CandidateItem {
    let link = maps_link(&listing, city);
    let id = listing.stable_id();
    let website = if listing.has_website() {
        listing.website.clone()
    } else {
        None
    };
    let snippet = listing
        .description
        .clone()
        .or_else(|| listing.business_type.clone())
        .unwrap_or_default();

    CandidateItem {
        id,
        title: listing.title,
        snippet,
        link,
        kind: ItemKind::Business(BusinessFields {
            rating: listing.rating,
            phone: listing.phone,
            website,
            address: listing.address,
            city: city.to_string(),
        }),
    }
}

pub struct DirectorySource {
    client: SerpApiClient,
}

impl DirectorySource {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: SerpApiClient::new(api_key.to_string()),
        }
    }
}

#[async_trait]
impl LeadSource for DirectorySource {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<CandidateItem>> {
        let WorkUnit::Directory { niche, city } = unit else {
            bail!("directory source cannot handle {unit}");
        };

        let query = format!("{niche} in {city}");
        let listings = self
            .client
            .maps_search(&query)
            .await
            .with_context(|| format!("maps search failed for '{query}'"))?;

        info!(query = query.as_str(), count = listings.len(), "directory: listings fetched");

        Ok(listings
            .into_iter()
            .filter(|l| !l.title.trim().is_empty())
            .map(|l| into_candidate(l, city))
            .collect())
    }
}

#[async_trait]
impl EmailFinder for DirectorySource {
    async fn find_email(&self, business: &str, city: &str) -> Result<Option<String>> {
        let query = format!("\"{business}\" {city} contact email");
        let raw = self
            .client
            .web_search_raw(&query)
            .await
            .with_context(|| format!("email search failed for '{business}'"))?;

        let email = extract_email(&raw.to_string());
        debug!(business, found = email.is_some(), "directory: email search complete");
        Ok(email)
    }
}
