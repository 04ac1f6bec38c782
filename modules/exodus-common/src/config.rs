use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::LeadBotError;

type Result<T> = std::result::Result<T, LeadBotError>;

const DEFAULT_CITIES: &[&str] = &[
    "Houston, TX",
    "Austin, TX",
    "Atlanta, GA",
    "Miami, FL",
    "Phoenix, AZ",
];

const DEFAULT_NICHES: &[&str] = &["Roofing", "Tree Trimming", "HVAC", "Pest Control"];

const DEFAULT_SUBREDDITS: &[&str] = &[
    "forhire",
    "slavelabour",
    "smallbusiness",
    "Entrepreneur",
    "startups",
    "freelance",
    "webdev",
];

const DEFAULT_KEYWORDS: &[&str] = &[
    "\"need a website\"",
    "\"need a web developer\"",
    "\"looking for a web developer\"",
    "\"looking for a developer\"",
    "\"hire a developer\"",
    "\"build my website\"",
    "\"website for my business\"",
    "\"redesign my website\"",
    "\"landing page\"",
    "\"shopify developer\"",
    "\"wordpress developer\"",
    "\"need an app\"",
    "\"build an app\"",
    "\"mvp developer\"",
    "\"technical cofounder\"",
    "\"automation help\"",
    "\"need a chatbot\"",
    "\"scrape data\"",
    "\"web scraping\"",
    "\"looking to hire\"",
];

const DEFAULT_DNS_API_URL: &str = "https://cloudflare-dns.com/dns-query";

/// Which source/filter pair this deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotMode {
    /// Places search + rule filter + email discovery + MX check.
    Directory,
    /// Subreddit RSS search + model-scored filter.
    Feed,
}

impl FromStr for BotMode {
    type Err = LeadBotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directory" | "maps" => Ok(BotMode::Directory),
            "feed" | "reddit" => Ok(BotMode::Feed),
            other => Err(LeadBotError::Config(format!(
                "BOT_MODE must be 'directory' or 'feed', got '{other}'"
            ))),
        }
    }
}

/// Timing discipline of the cycle scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Next cycle starts only after the previous one finished, plus a rest.
    FixedDelay,
    /// A cycle fires on every tick of a wall-clock timer; cycles may overlap.
    FixedInterval,
}

impl FromStr for ScheduleKind {
    type Err = LeadBotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fixed-delay" | "delay" => Ok(ScheduleKind::FixedDelay),
            "fixed-interval" | "interval" => Ok(ScheduleKind::FixedInterval),
            other => Err(LeadBotError::Config(format!(
                "SCHEDULE must be 'fixed-delay' or 'fixed-interval', got '{other}'"
            ))),
        }
    }
}

/// How many work units a single cycle covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePlan {
    /// One unit per cycle, advancing round-robin.
    Rotate,
    /// Every unit once per cycle.
    Sweep,
}

impl FromStr for CyclePlan {
    type Err = LeadBotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rotate" | "round-robin" => Ok(CyclePlan::Rotate),
            "sweep" | "all" => Ok(CyclePlan::Sweep),
            other => Err(LeadBotError::Config(format!(
                "CYCLE_PLAN must be 'rotate' or 'sweep', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Claude,
    OpenRouter,
}

impl AiProvider {
    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o-mini",
            AiProvider::Claude => "claude-3-5-haiku-latest",
            AiProvider::OpenRouter => "meta-llama/llama-3.1-8b-instruct",
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "OPENAI_API_KEY",
            AiProvider::Claude => "ANTHROPIC_API_KEY",
            AiProvider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl FromStr for AiProvider {
    type Err = LeadBotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "groq" => Ok(AiProvider::OpenAi),
            "claude" | "anthropic" => Ok(AiProvider::Claude),
            "openrouter" => Ok(AiProvider::OpenRouter),
            other => Err(LeadBotError::Config(format!(
                "AI_PROVIDER must be 'openai', 'claude' or 'openrouter', got '{other}'"
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: BotMode,

    // Directory search
    pub serpapi_key: Option<String>,
    pub cities: Vec<String>,
    pub niches: Vec<String>,
    pub min_rating: f64,

    // MX lookups (DNS-over-HTTPS)
    pub dns_api_url: String,
    pub dns_api_key: Option<String>,

    // Feed search
    pub keywords: Vec<String>,
    pub subreddits: Vec<String>,
    pub feed_batch_size: usize,

    // AI / LLM
    pub ai_provider: AiProvider,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_base_url: Option<String>,
    /// Upper bound on a single model call, connect through last byte.
    pub ai_timeout: Duration,
    pub score_threshold: f64,

    // Telegram
    pub log_bot_token: Option<String>,
    pub lead_bot_token: String,
    pub admin_chat_id: String,
    pub lead_chat_ids: Vec<String>,
    /// Mirror per-item skips and rejections to the admin chat.
    pub admin_log_verbose: bool,

    // Scheduling
    pub schedule: ScheduleKind,
    pub cycle_interval: Duration,
    pub cycle_plan: CyclePlan,
    pub item_pause: Duration,
    pub ledger_reset: Duration,

    // Liveness server
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mode: BotMode = parse_or(&get, "BOT_MODE", BotMode::Directory)?;
        let directory = mode == BotMode::Directory;

        let serpapi_key = get("SERPAPI_KEY");
        if directory && serpapi_key.is_none() {
            return Err(missing("SERPAPI_KEY"));
        }

        let ai_provider: AiProvider = parse_or(&get, "AI_PROVIDER", AiProvider::OpenAi)?;
        let ai_api_key = get("AI_API_KEY").or_else(|| get(ai_provider.key_var()));
        if !directory && ai_api_key.is_none() {
            return Err(missing("AI_API_KEY"));
        }
        let ai_model = get("AI_MODEL").unwrap_or_else(|| ai_provider.default_model().to_string());

        let lead_bot_token = get("LEAD_BOT_TOKEN").ok_or_else(|| missing("LEAD_BOT_TOKEN"))?;
        let admin_chat_id = get("MY_CHAT_ID").ok_or_else(|| missing("MY_CHAT_ID"))?;
        let lead_chat_ids = match get("LEAD_CHAT_IDS") {
            Some(raw) => split_list(&raw, ','),
            None => vec![admin_chat_id.clone()],
        };
        if lead_chat_ids.is_empty() {
            return Err(LeadBotError::Config(
                "LEAD_CHAT_IDS must name at least one recipient".into(),
            ));
        }

        let default_schedule = if directory {
            ScheduleKind::FixedInterval
        } else {
            ScheduleKind::FixedDelay
        };
        let default_plan = if directory {
            CyclePlan::Rotate
        } else {
            CyclePlan::Sweep
        };
        let default_interval_minutes = if directory { 40 } else { 4 };
        let default_pause_ms = if directory { 1000 } else { 0 };

        let interval_minutes: u64 =
            parse_or(&get, "CYCLE_INTERVAL_MINUTES", default_interval_minutes)?;
        if interval_minutes == 0 {
            return Err(LeadBotError::Config(
                "CYCLE_INTERVAL_MINUTES must be greater than zero".into(),
            ));
        }
        let reset_hours: u64 = parse_or(&get, "LEDGER_RESET_HOURS", 24)?;
        if reset_hours == 0 {
            return Err(LeadBotError::Config(
                "LEDGER_RESET_HOURS must be greater than zero".into(),
            ));
        }

        let cycle_interval = secs_checked("CYCLE_INTERVAL_MINUTES", interval_minutes, 60)?;
        let ledger_reset = secs_checked("LEDGER_RESET_HOURS", reset_hours, 3600)?;

        let ai_timeout_secs: u64 = parse_or(&get, "AI_TIMEOUT_SECS", 60)?;
        if ai_timeout_secs == 0 {
            return Err(LeadBotError::Config(
                "AI_TIMEOUT_SECS must be greater than zero".into(),
            ));
        }

        let score_threshold: f64 = parse_or(&get, "SCORE_THRESHOLD", 80.0)?;
        if !(0.0..=100.0).contains(&score_threshold) {
            return Err(LeadBotError::Config(
                "SCORE_THRESHOLD must be between 0 and 100".into(),
            ));
        }

        let config = Self {
            mode,
            serpapi_key,
            cities: list_or(&get, "CITIES", DEFAULT_CITIES),
            niches: list_or(&get, "NICHES", DEFAULT_NICHES),
            min_rating: parse_or(&get, "MIN_RATING", 4.0)?,
            dns_api_url: get("DNS_API_URL").unwrap_or_else(|| DEFAULT_DNS_API_URL.to_string()),
            dns_api_key: get("DNS_API_KEY"),
            keywords: list_or(&get, "KEYWORDS", DEFAULT_KEYWORDS),
            subreddits: list_or(&get, "SUBREDDITS", DEFAULT_SUBREDDITS),
            feed_batch_size: parse_or(&get, "FEED_BATCH_SIZE", 30)?,
            ai_provider,
            ai_api_key,
            ai_model,
            ai_base_url: get("AI_BASE_URL"),
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            score_threshold,
            log_bot_token: get("LOG_BOT_TOKEN"),
            lead_bot_token,
            admin_chat_id,
            lead_chat_ids,
            admin_log_verbose: parse_or(&get, "ADMIN_LOG_VERBOSE", true)?,
            schedule: parse_or(&get, "SCHEDULE", default_schedule)?,
            cycle_interval,
            cycle_plan: parse_or(&get, "CYCLE_PLAN", default_plan)?,
            item_pause: Duration::from_millis(parse_or(&get, "ITEM_PAUSE_MS", default_pause_ms)?),
            ledger_reset,
            port: parse_or(&get, "PORT", 10000)?,
        };

        if directory && (config.cities.is_empty() || config.niches.is_empty()) {
            return Err(LeadBotError::Config(
                "CITIES and NICHES must each list at least one entry".into(),
            ));
        }
        if !directory && (config.keywords.is_empty() || config.subreddits.is_empty()) {
            return Err(LeadBotError::Config(
                "KEYWORDS and SUBREDDITS must each list at least one entry".into(),
            ));
        }

        Ok(config)
    }

    /// Log the effective configuration without secrets.
    pub fn log_redacted(&self) {
        info!(
            mode = ?self.mode,
            schedule = ?self.schedule,
            cycle_plan = ?self.cycle_plan,
            interval_minutes = self.cycle_interval.as_secs() / 60,
            item_pause_ms = self.item_pause.as_millis() as u64,
            ledger_reset_hours = self.ledger_reset.as_secs() / 3600,
            recipients = self.lead_chat_ids.len(),
            admin_log = self.log_bot_token.is_some(),
            admin_log_verbose = self.admin_log_verbose,
            port = self.port,
            "Loaded configuration"
        );
        match self.mode {
            BotMode::Directory => info!(
                cities = self.cities.len(),
                niches = self.niches.len(),
                min_rating = self.min_rating,
                dns_api_url = %self.dns_api_url,
                "Directory search settings"
            ),
            BotMode::Feed => info!(
                keywords = self.keywords.len(),
                subreddits = self.subreddits.len(),
                batch_size = self.feed_batch_size,
                provider = ?self.ai_provider,
                model = %self.ai_model,
                ai_timeout_secs = self.ai_timeout.as_secs(),
                score_threshold = self.score_threshold,
                "Feed search settings"
            ),
        }
    }
}

fn missing(key: &str) -> LeadBotError {
    LeadBotError::Config(format!("{key} environment variable is required"))
}

fn secs_checked(key: &str, value: u64, unit_secs: u64) -> Result<Duration> {
    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| LeadBotError::Config(format!("{key} is too large ('{value}')")))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| LeadBotError::Config(format!("{key} is invalid ('{raw}'): {e}"))),
        None => Ok(default),
    }
}

fn list_or<G>(get: &G, key: &str, default: &[&str]) -> Vec<String>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => split_list(&raw, ';'),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
