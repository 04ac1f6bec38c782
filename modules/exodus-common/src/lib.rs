pub mod config;
pub mod error;
pub mod types;

pub use config::{AiProvider, AppConfig, BotMode, CyclePlan, ScheduleKind};
pub use error::LeadBotError;
pub use types::*;
