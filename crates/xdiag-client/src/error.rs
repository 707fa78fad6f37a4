//! X API client errors

use thiserror::Error;
use xdiag_core::ApiError;

/// Errors raised by [`XApiClient`](crate::XApiClient).
#[derive(Error, Debug)]
pub enum XApiError {
    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// OAuth 1.0a signing failed
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Non-success HTTP status
    #[error("X API error {status}: {message}")]
    Api {
        /// HTTP status
        status: u16,
        /// Problem detail, title or first error message
        message: String,
        /// Seconds until the rate-limit window resets
        retry_after: Option<u64>,
    },

    /// 200 response carrying only an `errors` array
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl XApiError {
    /// HTTP status, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<XApiError> for ApiError {
    fn from(err: XApiError) -> Self {
        match err {
            XApiError::Api {
                status,
                message,
                retry_after,
            } => {
                let error = ApiError::new(status, message);
                match retry_after {
                    Some(secs) => error.with_retry_after(secs),
                    None => error,
                }
            }
            XApiError::NotFound(message) => ApiError::new(404, message),
            XApiError::Http(e) if e.is_timeout() => ApiError::transport("request timed out"),
            XApiError::Http(e) => match e.status() {
                Some(status) => ApiError::new(status.as_u16(), e.to_string()),
                None => ApiError::transport(e.to_string()),
            },
            other => ApiError::transport(other.to_string()),
        }
    }
}

/// Result type for X API operations.
pub type XApiResult<T> = Result<T, XApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_conversion_keeps_status_and_retry() {
        let err: ApiError = XApiError::Api {
            status: 429,
            message: "Too Many Requests".into(),
            retry_after: Some(120),
        }
        .into();

        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "Too Many Requests");
        assert_eq!(err.retry_after_secs, Some(120));
    }

    #[test]
    fn test_not_found_conversion() {
        let err: ApiError =
            XApiError::NotFound("Could not find user with username: [ghost].".into()).into();
        assert_eq!(err.status, Some(404));
        assert!(err.message.contains("ghost"));
    }

    #[test]
    fn test_local_errors_have_no_status() {
        let err = XApiError::OAuth("bad key".into());
        assert_eq!(err.status(), None);

        let converted: ApiError = err.into();
        assert_eq!(converted.status, None);
        assert_eq!(converted.message, "OAuth error: bad key");
    }
}
