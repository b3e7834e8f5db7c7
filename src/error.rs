use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{platform} API error: {message}")]
    Api { platform: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Daemon error: {0}")]
    Daemon(String),
}

impl Error {
    pub fn api(platform: &str, message: impl Into<String>) -> Self {
        Error::Api {
            platform: platform.to_string(),
            message: message.into(),
        }
    }

    /// Transient transport failures, as opposed to a platform refusing the request.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

/// Request URLs carry the API key or bot token, so they never reach the message.
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.without_url().to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
