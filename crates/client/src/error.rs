use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to construct HTTP client: {0}")]
    Init(#[source] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to '{url}' timed out")]
    Timeout { url: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed response from '{url}': {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Whether a caller may reasonably retry the same request. Network
    /// trouble and upstream application errors are transient for a scraping
    /// API; malformed responses and setup failures are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Request { .. } => true,
            ClientError::Timeout { .. } => true,
            ClientError::Api(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
