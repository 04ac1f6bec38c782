// Wiring: turn an `AppConfig` into a ready-to-run `Worker`.

use std::sync::Arc;

use ai_client::{ChatModel, Claude, OpenAi, OpenRouter};
use anyhow::{anyhow, Context, Result};
use tracing::info;

use exodus_common::{AiProvider, AppConfig, BotMode};

use crate::notify::{AdminLog, MessageSender, Notifier, TelegramSender};
use crate::qualify::{DohMxChecker, ModelQualifier, Qualifier, RuleQualifier};
use crate::sources::{plan_work_units, DirectorySource, FeedSource, LeadSource};
use crate::worker::Worker;

/// Chat model for the configured provider. Every call is bounded by
/// `ai_timeout` so a stalled provider drops the item instead of the cycle.
pub fn build_model(config: &AppConfig) -> Result<Arc<dyn ChatModel>> {
    let key = config
        .ai_api_key
        .clone()
        .ok_or_else(|| anyhow!("AI_API_KEY is required to score feed posts"))?;

    let http = reqwest::Client::builder()
        .timeout(config.ai_timeout)
        .build()
        .context("failed to build model HTTP client")?;

    let model: Arc<dyn ChatModel> = match config.ai_provider {
        AiProvider::OpenAi => {
            let mut model = OpenAi::new(key, config.ai_model.as_str()).with_http_client(http);
            if let Some(ref url) = config.ai_base_url {
                model = model.with_base_url(url.as_str());
            }
            Arc::new(model)
        }
        AiProvider::Claude => {
            let mut model = Claude::new(key, config.ai_model.as_str()).with_http_client(http);
            if let Some(ref url) = config.ai_base_url {
                model = model.with_base_url(url.as_str());
            }
            Arc::new(model)
        }
        AiProvider::OpenRouter => Arc::new(
            OpenRouter::new(key, config.ai_model.as_str())
                .with_app_name("Exodus Hunter")
                .with_http_client(http),
        ),
    };
    Ok(model)
}

/// Admin log over the log bot, or tracing-only when no token is set.
pub fn build_admin_log(config: &AppConfig) -> AdminLog {
    match config.log_bot_token {
        Some(ref token) => AdminLog::new(
            Arc::new(TelegramSender::new(token.as_str())),
            config.admin_chat_id.as_str(),
            config.admin_log_verbose,
        ),
        None => {
            info!("No LOG_BOT_TOKEN set, admin chat mirroring disabled");
            AdminLog::disabled()
        }
    }
}

pub fn build_worker(config: &AppConfig) -> Result<Worker> {
    let units = plan_work_units(config);
    let admin = build_admin_log(config);

    let (source, qualifier): (Arc<dyn LeadSource>, Arc<dyn Qualifier>) = match config.mode {
        BotMode::Directory => {
            let key = config
                .serpapi_key
                .as_deref()
                .ok_or_else(|| anyhow!("SERPAPI_KEY is required in directory mode"))?;
            let directory = Arc::new(DirectorySource::new(key));
            let mx = Arc::new(DohMxChecker::new(
                config.dns_api_url.as_str(),
                config.dns_api_key.clone(),
            ));
            let qualifier = RuleQualifier::new(config.min_rating, directory.clone(), mx)
                .with_admin_log(admin.clone());
            (directory as Arc<dyn LeadSource>, Arc::new(qualifier) as Arc<dyn Qualifier>)
        }
        BotMode::Feed => {
            let source = FeedSource::new(config.subreddits.clone());
            let qualifier = ModelQualifier::new(build_model(config)?, config.score_threshold);
            (
                Arc::new(source) as Arc<dyn LeadSource>,
                Arc::new(qualifier) as Arc<dyn Qualifier>,
            )
        }
    };

    let lead_sender: Arc<dyn MessageSender> =
        Arc::new(TelegramSender::new(config.lead_bot_token.as_str()));
    let notifier = Notifier::new(lead_sender, config.lead_chat_ids.clone());

    info!(
        mode = ?config.mode,
        units = units.len(),
        recipients = notifier.recipients().len(),
        "Worker assembled"
    );

    Ok(Worker::new(units, source, qualifier, notifier)
        .with_plan(config.cycle_plan)
        .with_item_pause(config.item_pause)
        .with_admin_log(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::qualify::Qualification;
    use crate::testing::feed_item;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn directory_worker_rotates_city_niche_grid() {
        let worker = build_worker(&config(&[
            ("SERPAPI_KEY", "k"),
            ("LEAD_BOT_TOKEN", "1:t"),
            ("MY_CHAT_ID", "1"),
        ]))
        .unwrap();
        assert_eq!(worker.units().len(), 20);
    }

    #[test]
    fn feed_worker_builds_each_provider() {
        for provider in ["openai", "claude", "openrouter"] {
            let worker = build_worker(&config(&[
                ("BOT_MODE", "feed"),
                ("AI_PROVIDER", provider),
                ("AI_API_KEY", "sk"),
                ("LEAD_BOT_TOKEN", "1:t"),
                ("MY_CHAT_ID", "1"),
                ("FEED_BATCH_SIZE", "7"),
            ]))
            .unwrap();
            // 20 built-in keywords at 7 per batch.
            assert_eq!(worker.units().len(), 3, "{provider}");
        }
    }

    /// Accepts connections and never writes a byte back.
    async fn silent_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn stalled_provider_drops_item_within_timeout() {
        let base_url = silent_endpoint().await;
        for provider in ["openai", "claude"] {
            let config = config(&[
                ("BOT_MODE", "feed"),
                ("AI_PROVIDER", provider),
                ("AI_API_KEY", "sk"),
                ("AI_BASE_URL", base_url.as_str()),
                ("AI_TIMEOUT_SECS", "1"),
                ("LEAD_BOT_TOKEN", "1:t"),
                ("MY_CHAT_ID", "1"),
            ]);
            let qualifier = ModelQualifier::new(build_model(&config).unwrap(), 80.0);

            let outcome = tokio::time::timeout(
                std::time::Duration::from_secs(10),
                qualifier.qualify(&feed_item("t3_stall")),
            )
            .await
            .expect("model call outlived its timeout");

            assert!(
                matches!(outcome, Qualification::Dropped(_)),
                "{provider}: {outcome:?}"
            );
        }
    }
}
