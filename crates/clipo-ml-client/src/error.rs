//! ML client error types.

use thiserror::Error;

pub type MlResult<T> = Result<T, MlError>;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MlError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map a non-success HTTP status and body to an error.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = format!("{}: {}", status, body.chars().take(500).collect::<String>());
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || body.contains("rate_limit") {
            Self::RateLimited(detail)
        } else if status.is_server_error() {
            Self::ServiceUnavailable(detail)
        } else {
            Self::RequestFailed(detail)
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, MlError::RateLimited(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status() {
        assert!(MlError::from_status(StatusCode::TOO_MANY_REQUESTS, "").is_rate_limited());
        assert!(MlError::from_status(StatusCode::BAD_REQUEST, "{\"code\":\"rate_limit_exceeded\"}")
            .is_rate_limited());
        assert!(matches!(
            MlError::from_status(StatusCode::BAD_GATEWAY, ""),
            MlError::ServiceUnavailable(_)
        ));
        assert!(!MlError::from_status(StatusCode::UNAUTHORIZED, "bad key").is_rate_limited());
    }
}
