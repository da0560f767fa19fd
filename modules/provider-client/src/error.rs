use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Failure talking to a data provider. The pipeline records the message
/// verbatim, so variants carry enough to tell an outage from a bad key.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("credentials rejected (status {0})")]
    Unauthorized(u16),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ProviderError::Unauthorized(status),
            429 => ProviderError::RateLimited,
            _ => ProviderError::Status { status, body },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}
