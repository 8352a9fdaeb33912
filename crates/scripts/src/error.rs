//! Error types for script reconciliation.

use landscape::ApiResponse;

/// Result type alias for script operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a create/read/update/delete/import.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable response came back.
    #[error("{operation}: {source}")]
    Transport {
        /// Operation that failed.
        operation: String,
        /// Underlying client error.
        #[source]
        source: landscape::Error,
    },

    /// The server rejected the request (400).
    #[error("{operation} was rejected: {message}")]
    ClientError {
        /// Operation that failed.
        operation: String,
        /// Server message, or a generic fallback.
        message: String,
    },

    /// The server reported the target missing (404).
    #[error("{operation}: not found: {message}")]
    NotFound {
        /// Operation that failed.
        operation: String,
        /// Server message, or a generic fallback.
        message: String,
    },

    /// Any status outside the documented set.
    #[error("{operation}: unexpected HTTP {status}: {body}")]
    UnexpectedStatus {
        /// Operation that failed.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The payload matched neither script generation.
    #[error("unrecognized script shape: {0}")]
    UnrecognizedShape(String),

    /// An attachment list mixed filenames and objects, or held neither.
    #[error("unrecognized attachment collection: {0}")]
    MixedAttachments(String),

    /// A sub-payload had the wrong type.
    #[error("malformed {what}: {reason}")]
    Malformed {
        /// What was being decoded.
        what: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A required input attribute was not set.
    #[error("missing required attribute `{0}`")]
    MissingInput(&'static str),

    /// The operation cannot be performed.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A pinned resource kind read a script of the other generation.
    #[error("script {id} is a {actual} script, expected {expected}")]
    VariantMismatch {
        /// Script id.
        id: i64,
        /// Generation the kind is pinned to.
        expected: &'static str,
        /// Generation the server returned.
        actual: &'static str,
    },

    /// An import id could not be parsed.
    #[error("invalid import id {id:?}: {reason}")]
    InvalidImportId {
        /// Import id as given.
        id: String,
        /// Expected format.
        reason: String,
    },
}

impl Error {
    /// Closure mapping a client error to [`Error::Transport`].
    pub fn transport(operation: &str) -> impl FnOnce(landscape::Error) -> Self + '_ {
        move |source| Self::Transport {
            operation: operation.to_string(),
            source,
        }
    }

    /// Short title for a diagnostic summary.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "Request failed",
            Self::ClientError { .. } => "Request rejected",
            Self::NotFound { .. } => "Not found",
            Self::UnexpectedStatus { .. } => "Unexpected response",
            Self::UnrecognizedShape(_) | Self::MixedAttachments(_) | Self::Malformed { .. } => {
                "Unrecognized response"
            }
            Self::MissingInput(_) => "Missing required attribute",
            Self::Unsupported(_) => "Unsupported operation",
            Self::VariantMismatch { .. } => "Wrong script type",
            Self::InvalidImportId { .. } => "Invalid import ID",
        }
    }

    /// Attribute the error is about, when there is one.
    #[must_use]
    pub fn attribute(&self) -> Option<&'static str> {
        match self {
            Self::MissingInput(name) => Some(name),
            _ => None,
        }
    }
}

/// Unwrap a success response, turning every other arm into an [`Error`].
pub fn expect_ok<T>(response: ApiResponse<T>, operation: &str) -> Result<T> {
    match response {
        ApiResponse::Ok(value) => Ok(value),
        ApiResponse::BadRequest { message } => Err(Error::ClientError {
            operation: operation.to_string(),
            message: message.unwrap_or_else(|| "the server rejected the request".to_string()),
        }),
        ApiResponse::NotFound { message } => Err(Error::NotFound {
            operation: operation.to_string(),
            message: message.unwrap_or_else(|| "no such object".to_string()),
        }),
        ApiResponse::Unexpected { status, body } => Err(Error::UnexpectedStatus {
            operation: operation.to_string(),
            status,
            body,
        }),
    }
}
