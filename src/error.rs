use thiserror::Error;

#[derive(Debug, Error)]
pub enum FluxError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Client error: {0}")]
    ClientError(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("API key invalid or expired")]
    AuthInvalid,
    #[error("Rate limited by the API, try again later")]
    RateLimited,
    #[error("Server error: HTTP {0}")]
    ServerError(u16),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Connection failed: {0}")]
    ConnectionError(String),
    #[error("API request failed: {0}")]
    BadRequest(String),
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    #[error("No image URL found in response")]
    NoImageFound,
    #[error("Invalid image URL in response: {0}")]
    InvalidUrl(String),
    #[error("Image download failed: {0}")]
    DownloadFailed(String),
    #[error("Batch failed, no images generated: {0}")]
    BatchFailed(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
}

impl FluxError {
    /// Whether the executor may retry the call that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FluxError::ServerError(_) | FluxError::Timeout(_) | FluxError::ConnectionError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FluxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(FluxError::ServerError(503).is_retryable());
        assert!(FluxError::Timeout("read".into()).is_retryable());
        assert!(FluxError::ConnectionError("refused".into()).is_retryable());
        assert!(!FluxError::AuthInvalid.is_retryable());
        assert!(!FluxError::RateLimited.is_retryable());
        assert!(!FluxError::BadRequest("bad".into()).is_retryable());
    }
}
