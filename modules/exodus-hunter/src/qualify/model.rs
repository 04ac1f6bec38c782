// Model-scored qualification for feed posts.
//
// The provider is untrusted free-form text: the verdict is parsed leniently
// and anything unusable drops the item instead of failing the cycle.

use std::sync::Arc;

use ai_client::{extract_json_object, strip_code_blocks, ChatModel, StructuredOutput};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use exodus_common::{CandidateItem, Lead, LeadDetail, Verdict};

use super::{Qualification, Qualifier};

const SYSTEM_PROMPT: &str = "You qualify posts from online communities as sales leads for a \
freelance web and automation developer. Score how likely the author is to pay for a website, \
web app, automation or scraping work in the near future: 0 means irrelevant, 100 means an \
explicit, funded request. Job seekers, developers advertising themselves and spam score below 20.\n\
\n\
Respond with ONLY a JSON object, no prose and no code fences, matching this schema:\n";

#[derive(Debug, Error, PartialEq)]
pub enum VerdictError {
    #[error("no JSON object in model response")]
    NoJson,

    #[error("malformed verdict: {0}")]
    Malformed(String),

    #[error("score {0} outside 0..=100")]
    ScoreOutOfRange(f64),
}

/// Parse a model response into a verdict, tolerating code fences and
/// surrounding prose.
pub fn parse_verdict(raw: &str) -> Result<Verdict, VerdictError> {
    let unfenced = strip_code_blocks(raw);
    let json = extract_json_object(unfenced).ok_or(VerdictError::NoJson)?;

    let verdict: Verdict =
        serde_json::from_str(json).map_err(|e| VerdictError::Malformed(e.to_string()))?;

    if !verdict.score.is_finite() || !(0.0..=100.0).contains(&verdict.score) {
        return Err(VerdictError::ScoreOutOfRange(verdict.score));
    }
    Ok(verdict)
}

fn system_prompt() -> String {
    format!("{SYSTEM_PROMPT}{}", Verdict::strict_schema())
}

fn user_prompt(item: &CandidateItem) -> String {
    format!("Title: {}\n\nPost:\n{}", item.title, item.snippet)
}

pub struct ModelQualifier {
    model: Arc<dyn ChatModel>,
    threshold: f64,
    system: String,
}

impl ModelQualifier {
    pub fn new(model: Arc<dyn ChatModel>, threshold: f64) -> Self {
        Self {
            model,
            threshold,
            system: system_prompt(),
        }
    }
}

#[async_trait]
impl Qualifier for ModelQualifier {
    async fn qualify(&self, item: &CandidateItem) -> Qualification {
        let response = match self
            .model
            .chat_completion(&self.system, &user_prompt(item))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    provider = self.model.provider(),
                    item = item.id.as_str(),
                    error = %e,
                    "model call failed"
                );
                return Qualification::Dropped(format!("model call failed: {e:#}"));
            }
        };

        let verdict = match parse_verdict(&response) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(item = item.id.as_str(), error = %e, response = response.as_str(), "no verdict");
                return Qualification::Dropped(format!("no verdict: {e}"));
            }
        };

        info!(
            item = item.id.as_str(),
            score = verdict.score,
            threshold = self.threshold,
            "model verdict"
        );

        if verdict.score >= self.threshold {
            Qualification::Accepted(Lead {
                item: item.clone(),
                detail: LeadDetail::Scored(verdict),
            })
        } else {
            Qualification::Rejected(format!(
                "score {} below {}",
                verdict.score, self.threshold
            ))
        }
    }
}
