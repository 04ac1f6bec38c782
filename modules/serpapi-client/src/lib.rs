pub mod error;
pub mod types;

pub use error::{Result, SerpApiError};
pub use types::{LocalResult, MapsResponse};

use std::time::Duration;

const BASE_URL: &str = "https://serpapi.com/search";

pub struct SerpApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Search Google Maps for `query` and return the local business listings.
    pub async fn maps_search(&self, query: &str) -> Result<Vec<LocalResult>> {
        tracing::info!(query, "serpapi: google_maps search");

        let value = self
            .get(&[("engine", "google_maps"), ("type", "search"), ("q", query)])
            .await?;
        let response: MapsResponse = serde_json::from_value(value)?;

        if let Some(error) = response.error {
            // "no results" is reported as an error string; treat it as empty.
            if error.contains("hasn't returned any results") {
                return Ok(Vec::new());
            }
            return Err(SerpApiError::Search(error));
        }

        tracing::info!(query, count = response.local_results.len(), "serpapi: maps search complete");
        Ok(response.local_results)
    }

    /// Run a Google web search and return the untouched JSON body.
    ///
    /// Callers scan the raw text (snippets, knowledge graph, related
    /// questions) so no structure is imposed here.
    pub async fn web_search_raw(&self, query: &str) -> Result<serde_json::Value> {
        tracing::debug!(query, "serpapi: google web search");
        self.get(&[("engine", "google"), ("q", query)]).await
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SerpApiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}
