// Source adapters: one fetch per work unit, no retries.
//
// A fetch error is returned to the worker, which logs it and treats the unit
// as having produced nothing. Adapters never decide what is a lead.

pub mod directory;
pub mod feed;

pub use directory::{extract_email, DirectorySource};
pub use feed::{chunk_keywords, FeedSource};

use anyhow::Result;
use async_trait::async_trait;

use exodus_common::{AppConfig, BotMode, CandidateItem, WorkUnit};

#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Fetch one page of candidates for `unit`.
    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<CandidateItem>>;
}

/// Looks up a contact email for a business found by a directory search.
#[async_trait]
pub trait EmailFinder: Send + Sync {
    async fn find_email(&self, business: &str, city: &str) -> Result<Option<String>>;
}

/// Build the static work-unit list for this deployment.
///
/// Directory mode walks every niche for the first city before moving on to
/// the next city. Feed mode produces one unit per keyword chunk.
pub fn plan_work_units(config: &AppConfig) -> Vec<WorkUnit> {
    match config.mode {
        BotMode::Directory => config
            .cities
            .iter()
            .flat_map(|city| {
                config
                    .niches
                    .iter()
                    .map(move |niche| WorkUnit::directory(niche.clone(), city.clone()))
            })
            .collect(),
        BotMode::Feed => chunk_keywords(&config.keywords, config.feed_batch_size)
            .into_iter()
            .enumerate()
            .map(|(index, keywords)| WorkUnit::FeedBatch { index, keywords })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn directory_units_rotate_niche_fastest() {
        let config = config(&[
            ("SERPAPI_KEY", "k"),
            ("LEAD_BOT_TOKEN", "t"),
            ("MY_CHAT_ID", "1"),
            ("CITIES", "Houston, TX;Austin, TX"),
            ("NICHES", "Roofing;HVAC;Pest Control"),
        ]);
        let units = plan_work_units(&config);
        assert_eq!(units.len(), 6);
        assert_eq!(units[0], WorkUnit::directory("Roofing", "Houston, TX"));
        assert_eq!(units[1], WorkUnit::directory("HVAC", "Houston, TX"));
        assert_eq!(units[3], WorkUnit::directory("Roofing", "Austin, TX"));
    }

    #[test]
    fn feed_units_follow_keyword_chunks() {
        let keywords: Vec<String> = (0..61).map(|i| format!("k{i}")).collect();
        let joined = keywords.join(";");
        let config = config(&[
            ("BOT_MODE", "feed"),
            ("AI_API_KEY", "sk"),
            ("LEAD_BOT_TOKEN", "t"),
            ("MY_CHAT_ID", "1"),
            ("KEYWORDS", joined.as_str()),
        ]);
        let units = plan_work_units(&config);
        assert_eq!(units.len(), 3);
        match &units[2] {
            WorkUnit::FeedBatch { index, keywords } => {
                assert_eq!(*index, 2);
                assert_eq!(keywords, &vec!["k60".to_string()]);
            }
            other => panic!("unexpected unit {other:?}"),
        }
    }
}
