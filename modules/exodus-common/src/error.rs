use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadBotError {
    #[error("Configuration error: {0}")]
    Config(String),
}
