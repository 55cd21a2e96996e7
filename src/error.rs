use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("process error: {0}")]
    Process(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("prompt error: {0}")]
    Prompt(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, Error>;
