//! Error types for Rubykit

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed low-level cause attached to corruption errors
pub type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Maximum number of body bytes kept on HTTP errors for diagnostics
pub const BODY_EXCERPT_LIMIT: usize = 500;

/// Errors that can occur while fetching and normalizing upstream data
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered 404
    #[error("Resource not found: {url} (HTTP {status})")]
    NotFound {
        status: u16,
        url: String,
        body: String,
    },

    /// Upstream answered with another 4xx status
    #[error("Client error: HTTP {status} for {url}")]
    ClientError {
        status: u16,
        url: String,
        body: String,
    },

    /// Upstream answered with a 5xx status
    #[error("Server error: HTTP {status} for {url}")]
    ServerError {
        status: u16,
        url: String,
        body: String,
    },

    /// Transport failure or an unexpected non-2xx status (e.g. redirects)
    #[error("API error: {message}")]
    ApiError {
        message: String,
        status: Option<u16>,
        url: Option<String>,
        body: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Response failed integrity or shape validation
    #[error("Corrupted data: {message}")]
    CorruptedData {
        message: String,
        size: usize,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Response body is larger than the configured ceiling
    #[error("Response size {size} bytes exceeds maximum of {max_size} bytes")]
    ResponseSizeExceeded { size: u64, max_size: u64 },

    /// Caller-supplied argument failed a precondition
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),
}

impl FetchError {
    /// Classify an HTTP error status
    pub fn from_status(status: u16, url: &str, body: &[u8]) -> Self {
        let url = url.to_string();
        let body = body_excerpt(body);
        match status {
            404 => FetchError::NotFound { status, url, body },
            400..=499 => FetchError::ClientError { status, url, body },
            500..=599 => FetchError::ServerError { status, url, body },
            _ => FetchError::ApiError {
                message: format!("Unexpected HTTP status {} for {}", status, url),
                status: Some(status),
                url: Some(url),
                body: Some(body),
                source: None,
            },
        }
    }

    /// Create an error from a reqwest transport error
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        let message = if is_tls_error(&err) {
            format!("SSL/TLS error while requesting {}: {}", url, error_chain(&err))
        } else {
            let class = if err.is_timeout() {
                "Timeout"
            } else if err.is_connect() {
                "ConnectError"
            } else if err.is_body() || err.is_decode() {
                "BodyError"
            } else {
                "RequestError"
            };
            format!("{} while requesting {}: {}", class, url, error_chain(&err))
        };

        FetchError::ApiError {
            message,
            status: None,
            url: Some(url.to_string()),
            body: None,
            source: Some(err),
        }
    }

    /// Build a corruption error without an underlying cause
    pub fn corrupted(message: impl Into<String>, size: usize) -> Self {
        FetchError::CorruptedData {
            message: message.into(),
            size,
            source: None,
        }
    }

    /// Build a corruption error wrapping the low-level cause
    pub fn corrupted_with<E>(message: impl Into<String>, size: usize, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        FetchError::CorruptedData {
            message: message.into(),
            size,
            source: Some(Box::new(source)),
        }
    }

    /// HTTP status associated with the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::NotFound { status, .. }
            | FetchError::ClientError { status, .. }
            | FetchError::ServerError { status, .. } => Some(*status),
            FetchError::ApiError { status, .. } => *status,
            _ => None,
        }
    }

    /// True for the errors a fan-out operation reports inline
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            FetchError::CorruptedData { .. } | FetchError::ResponseSizeExceeded { .. }
        )
    }
}

/// Truncate a body to at most [`BODY_EXCERPT_LIMIT`] bytes on a char boundary
fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= BODY_EXCERPT_LIMIT {
        return text.into_owned();
    }
    let mut end = BODY_EXCERPT_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}

fn is_tls_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let err = FetchError::from_status(404, "https://rubygems.org/x", b"missing");
        assert!(matches!(err, FetchError::NotFound { status: 404, .. }));
        assert!(err.to_string().to_lowercase().contains("not found"));

        let err = FetchError::from_status(429, "https://rubygems.org/x", b"");
        assert!(matches!(err, FetchError::ClientError { status: 429, .. }));

        let err = FetchError::from_status(503, "https://rubygems.org/x", b"");
        assert!(matches!(err, FetchError::ServerError { status: 503, .. }));

        let err = FetchError::from_status(302, "https://rubygems.org/x", b"");
        assert!(matches!(err, FetchError::ApiError { status: Some(302), .. }));
        assert_eq!(err.status_code(), Some(302));
    }

    #[test]
    fn test_body_excerpt_is_truncated() {
        let body = "é".repeat(400);
        let err = FetchError::from_status(500, "https://example.com", body.as_bytes());
        match err {
            FetchError::ServerError { body, .. } => assert!(body.len() <= BODY_EXCERPT_LIMIT),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FetchError::ResponseSizeExceeded {
                size: 20,
                max_size: 10
            }
            .to_string(),
            "Response size 20 bytes exceeds maximum of 10 bytes"
        );
        assert_eq!(
            FetchError::Validation("gem name must not be blank".to_string()).to_string(),
            "Invalid argument: gem name must not be blank"
        );
        assert_eq!(
            FetchError::corrupted("HTML instead of JSON", 12).to_string(),
            "Corrupted data: HTML instead of JSON"
        );
    }

    #[test]
    fn test_corrupted_with_keeps_source() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = FetchError::corrupted_with("bad json", 1, parse_err);
        assert!(StdError::source(&err).is_some());
        assert!(err.is_data_integrity());
    }
}
