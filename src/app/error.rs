use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum SatchelError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SatchelError {
    pub fn is_invalid_url(&self) -> bool {
        matches!(self, SatchelError::InvalidUrl(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, SatchelError::Network(_))
    }
}

// Transport failures of every kind (connect, timeout, status, body) are network errors.
impl From<reqwest::Error> for SatchelError {
    fn from(e: reqwest::Error) -> Self {
        SatchelError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for SatchelError {
    fn from(e: serde_json::Error) -> Self {
        SatchelError::Network(format!("malformed response body: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, SatchelError>;
