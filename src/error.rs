use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Storage Errors
    #[error("Storage fault: {0}")]
    Storage(String),

    // Price Infrastructure Errors
    #[error("Expected exactly 2 price sources, got {0}")]
    InvalidSourceCount(usize),

    #[error("Cannot aggregate {0} quotes, need exactly 2")]
    InsufficientQuotes(usize),

    #[error("Aggregated price is not finite: {0}")]
    NonFiniteAggregate(f64),

    // Boundary Errors
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(e: prometheus::Error) -> Self {
        Error::MetricsError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
