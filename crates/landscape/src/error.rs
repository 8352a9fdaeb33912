//! Error types for Landscape API calls.
//!
//! Only failures that happen before a usable HTTP response exists are errors
//! here. Status codes the API documents (400, 404) come back as
//! [`ApiResponse`](crate::ApiResponse) variants so callers can tell them apart.

use std::fmt;

/// Result type alias for Landscape client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of client errors.
///
/// The client never retries on its own. Callers that own a retry policy use
/// the category to decide whether another attempt makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable).
    Network,
    /// Credentials were rejected or missing.
    Authentication,
    /// The response body could not be decoded.
    Format,
    /// The caller's deadline passed before the call could start.
    Deadline,
    /// Bad configuration such as an unusable API URL.
    Configuration,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Authentication => "Authentication failed",
            Self::Format => "Invalid response format",
            Self::Deadline => "Deadline exceeded",
            Self::Configuration => "Invalid client configuration",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check connectivity to the Landscape server and try again",
            Self::Authentication => "Verify the email/password or access key/secret key pair",
            Self::Format => "The server returned data this client does not understand",
            Self::Deadline => "Raise the operation timeout or retry when the server is less busy",
            Self::Configuration => "Check the api_url setting",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the Landscape API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Login was rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The call context's deadline passed before the call was issued.
    #[error("deadline exceeded before {operation}")]
    DeadlineExceeded {
        /// Operation that was about to start.
        operation: String,
    },

    /// The configured API URL is unusable.
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpError { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Authentication(_) => ErrorCategory::Authentication,
            Error::DeadlineExceeded { .. } => ErrorCategory::Deadline,
            Error::InvalidUrl { .. } => ErrorCategory::Configuration,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_errors_are_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Authentication.is_retryable());
        assert!(!ErrorCategory::Format.is_retryable());
        assert!(!ErrorCategory::Deadline.is_retryable());
        assert!(!ErrorCategory::Configuration.is_retryable());
        assert!(!ErrorCategory::Other.is_retryable());
    }

    #[test]
    fn test_error_category_advice() {
        assert!(!ErrorCategory::Network.advice().is_empty());
        assert!(!ErrorCategory::Deadline.advice().is_empty());
    }

    #[test]
    fn test_error_http_category() {
        let err = Error::http("connection reset", Some(502));
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_deadline_error_display() {
        let err = Error::DeadlineExceeded {
            operation: "GET /scripts/4".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Deadline);
        assert!(err.to_string().contains("/scripts/4"));
    }

    #[test]
    fn test_error_from_serde() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
