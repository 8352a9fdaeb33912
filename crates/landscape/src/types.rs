//! Core types for the Landscape client.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Responses
// ============================================================================

/// Outcome of a call that reached the server.
///
/// Status codes are classified once, at the transport boundary. Anything
/// outside 2xx/400/404 is kept verbatim so callers can report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    /// 2xx with a decoded body.
    Ok(T),
    /// 400, with the server's message when it sent one.
    BadRequest {
        /// Human-readable message from the error body.
        message: Option<String>,
    },
    /// 404, with the server's message when it sent one.
    NotFound {
        /// Human-readable message from the error body.
        message: Option<String>,
    },
    /// Any other status.
    Unexpected {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl<T> ApiResponse<T> {
    /// Map the success payload, keeping every error arm as is.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            Self::Ok(value) => ApiResponse::Ok(f(value)),
            Self::BadRequest { message } => ApiResponse::BadRequest { message },
            Self::NotFound { message } => ApiResponse::NotFound { message },
            Self::Unexpected { status, body } => ApiResponse::Unexpected { status, body },
        }
    }

    /// Whether the server answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Success payload, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }
}

// ============================================================================
// Legacy actions
// ============================================================================

/// API version sent with every legacy action call.
pub const LEGACY_API_VERSION: &str = "2011-08-01";

/// Named actions of the parameter-encoded legacy API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegacyAction {
    /// Create a script (either generation).
    CreateScript,
    /// Edit fields of an existing script.
    EditScript,
    /// Physically remove a legacy script.
    RemoveScript,
    /// Fetch the code of a legacy script.
    GetScriptCode,
    /// Upload an attachment (filename and content packed together).
    CreateScriptAttachment,
    /// Remove an attachment by id or filename.
    RemoveScriptAttachment,
}

impl LegacyAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::CreateScript,
        Self::EditScript,
        Self::RemoveScript,
        Self::GetScriptCode,
        Self::CreateScriptAttachment,
        Self::RemoveScriptAttachment,
    ];

    /// Action name as it appears on the wire.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateScript => "CreateScript",
            Self::EditScript => "EditScript",
            Self::RemoveScript => "RemoveScript",
            Self::GetScriptCode => "GetScriptCode",
            Self::CreateScriptAttachment => "CreateScriptAttachment",
            Self::RemoveScriptAttachment => "RemoveScriptAttachment",
        }
    }
}

impl fmt::Display for LegacyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flat string-keyed parameters for a legacy action.
///
/// Keys are kept sorted so request logs and recorded calls are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    /// Create an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Builder form of [`Params::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Value of a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether a parameter is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Login credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Email and password, optionally scoped to an account.
    EmailPassword {
        /// Login email.
        email: String,
        /// Login password.
        password: String,
        /// Account name for multi-account users.
        account: Option<String>,
    },
    /// API access key pair.
    AccessKey {
        /// Access key id.
        access_key: String,
        /// Secret key.
        secret_key: String,
    },
}

impl Credentials {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmailPassword { .. } => "email/password",
            Self::AccessKey { .. } => "access key",
        }
    }
}

// Secrets stay out of debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailPassword { email, account, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .field("password", &"<redacted>")
                .field("account", account)
                .finish(),
            Self::AccessKey { access_key, .. } => f
                .debug_struct("AccessKey")
                .field("access_key", access_key)
                .field("secret_key", &"<redacted>")
                .finish(),
        }
    }
}

// ============================================================================
// Call context
// ============================================================================

/// Per-operation context threaded through every remote call.
///
/// Carries the caller's deadline. There is no other cancellation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context with no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// A context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` means unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail if the deadline has already passed.
    pub fn check(&self, operation: &str) -> Result<()> {
        match self.remaining() {
            Some(left) if left.is_zero() => Err(Error::DeadlineExceeded {
                operation: operation.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_map_keeps_errors() {
        let ok: ApiResponse<i32> = ApiResponse::Ok(2);
        assert_eq!(ok.map(|v| v * 2), ApiResponse::Ok(4));

        let missing: ApiResponse<i32> = ApiResponse::NotFound {
            message: Some("gone".into()),
        };
        let mapped = missing.map(|v| v.to_string());
        assert!(mapped.is_not_found());
        assert_eq!(mapped.ok(), None);
    }

    #[test]
    fn test_legacy_action_names() {
        assert_eq!(LegacyAction::CreateScript.name(), "CreateScript");
        assert_eq!(
            LegacyAction::RemoveScriptAttachment.to_string(),
            "RemoveScriptAttachment"
        );
        assert_eq!(LegacyAction::ALL.len(), 6);
    }

    #[test]
    fn test_params_sorted_and_replaced() {
        let params = Params::new()
            .with("title", "first")
            .with("script_id", 7)
            .with("title", "second");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("title"), Some("second"));
        assert!(params.contains("script_id"));
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["script_id", "title"]);
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::AccessKey {
            access_key: "AK".into(),
            secret_key: "very-secret".into(),
        };
        let out = format!("{creds:?}");
        assert!(out.contains("AK"));
        assert!(!out.contains("very-secret"));
        assert_eq!(creds.kind(), "access key");
    }

    #[test]
    fn test_background_context_never_expires() {
        let ctx = CallContext::background();
        assert_eq!(ctx.remaining(), None);
        assert!(ctx.check("GET /scripts/1").is_ok());
    }

    #[test]
    fn test_expired_context_refuses_calls() {
        let ctx = CallContext::with_deadline(Instant::now());
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        let err = ctx.check("GET /scripts/1").unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded { .. }));
    }

    #[test]
    fn test_timeout_context_has_time_left() {
        let ctx = CallContext::with_timeout(Duration::from_secs(60));
        let left = ctx.remaining().unwrap();
        assert!(left > Duration::from_secs(50));
        assert!(ctx.check("op").is_ok());
    }
}
