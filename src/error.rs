use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Collection failed: {0}")]
    Collection(String),

    #[error("Invalid token {symbol}: {reason}")]
    InvalidToken { symbol: String, reason: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("No free port in range {start}-{end}")]
    NoFreePort { start: u16, end: u16 },

    #[error("Configuration error: {0}")]
    Config(String),
}
