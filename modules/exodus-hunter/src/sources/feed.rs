// Subreddit search over Reddit's RSS endpoint.
// Keywords are OR-joined in chunks so the query string stays short.

use std::sync::OnceLock;
use std::time::Duration;

use ai_client::truncate_to_char_boundary;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use tracing::info;

use exodus_common::{CandidateItem, ItemKind, WorkUnit};

use super::LeadSource;

const REDDIT_BASE_URL: &str = "https://www.reddit.com";
const USER_AGENT: &str = "exodus-hunter/0.1 (lead search; contact via bot admin)";
const SNIPPET_MAX_BYTES: usize = 1500;

/// Split `keywords` into batches of at most `batch_size` terms, preserving
/// order. A batch size of zero is treated as one.
pub fn chunk_keywords(keywords: &[String], batch_size: usize) -> Vec<Vec<String>> {
    keywords
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"))
}

/// Strip markup from an entry body and collapse whitespace.
fn plain_text(html: &str) -> String {
    let without_tags = tag_pattern().replace_all(html, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    whitespace_pattern()
        .replace_all(decoded.trim(), " ")
        .into_owned()
}

/// Parse an RSS/Atom document into feed candidates.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<CandidateItem>> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse RSS/Atom feed")?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let id = if entry.id.is_empty() {
                link.clone()
            } else {
                entry.id.clone()
            };

            let body = entry
                .content
                .as_ref()
                .and_then(|c| c.body.clone())
                .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
                .unwrap_or_default();
            let snippet = plain_text(&body);
            let snippet = truncate_to_char_boundary(&snippet, SNIPPET_MAX_BYTES).to_string();

            let community = entry.categories.first().map(|c| {
                c.label.clone().unwrap_or_else(|| c.term.clone())
            });

            Some(CandidateItem {
                id,
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                snippet,
                link,
                kind: ItemKind::FeedEntry {
                    community,
                    published: entry
                        .published
                        .or(entry.updated)
                        .map(|dt| dt.with_timezone(&Utc)),
                },
            })
        })
        .collect();

    Ok(items)
}

pub struct FeedSource {
    client: reqwest::Client,
    base_url: String,
    subreddits: Vec<String>,
}

impl FeedSource {
    pub fn new(subreddits: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: REDDIT_BASE_URL.to_string(),
            subreddits,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Search URL restricted to the configured subreddits, newest first.
    pub fn search_url(&self, keywords: &[String]) -> Result<url::Url> {
        let communities = self.subreddits.join("+");
        let base = format!("{}/r/{}/search.rss", self.base_url, communities);
        let query = keywords.join(" OR ");
        url::Url::parse_with_params(
            &base,
            &[
                ("q", query.as_str()),
                ("restrict_sr", "on"),
                ("sort", "new"),
                ("t", "day"),
            ],
        )
        .with_context(|| format!("invalid feed search url '{base}'"))
    }
}

#[async_trait]
impl LeadSource for FeedSource {
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<CandidateItem>> {
        let WorkUnit::FeedBatch { keywords, .. } = unit else {
            bail!("feed source cannot handle {unit}");
        };

        let url = self.search_url(keywords)?;
        let resp = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .context("RSS feed fetch failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("RSS feed returned {status}");
        }

        let bytes = resp.bytes().await.context("Failed to read RSS feed body")?;
        let items = parse_entries(&bytes[..])?;

        info!(unit = %unit, items = items.len(), "feed: parsed successfully");
        Ok(items)
    }
}
