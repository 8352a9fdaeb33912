//! User-facing diagnostics returned by every operation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Result of an exposed operation.
pub type Outcome<T> = std::result::Result<T, Diagnostics>;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The operation failed.
    Error,
    /// The operation succeeded but something deserves attention.
    Warning,
}

/// One message attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// One-line title.
    pub summary: String,
    /// Full explanation.
    pub detail: String,
    /// Attribute the message is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.summary, self.detail)?;
        if let Some(attr) = &self.attribute {
            write!(f, " (attribute `{attr}`)")?;
        }
        Ok(())
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error.
    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        });
    }

    /// Add a warning.
    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.0.push(Diagnostic {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        });
    }

    /// Add an [`Error`] as an error diagnostic.
    pub fn push_error(&mut self, err: &Error) {
        self.0.push(Diagnostic {
            severity: Severity::Error,
            summary: err.summary().to_string(),
            detail: err.to_string(),
            attribute: err.attribute().map(str::to_string),
        });
    }

    /// Append every diagnostic from `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Whether any diagnostic is an error.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    /// Error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Warning diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Every diagnostic, in order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are none.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Err(self)` if an error was recorded, otherwise `Ok(())`.
    pub fn check(self) -> Outcome<()> {
        if self.has_error() { Err(self) } else { Ok(()) }
    }
}

impl From<Error> for Diagnostics {
    fn from(err: Error) -> Self {
        let mut diags = Self::new();
        diags.push_error(&err);
        diags
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diag}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_keeps_attribute() {
        let diags = Diagnostics::from(Error::MissingInput("code"));
        assert!(diags.has_error());
        let first = diags.iter().next().unwrap();
        assert_eq!(first.attribute.as_deref(), Some("code"));
        assert_eq!(first.summary, "Missing required attribute");
    }

    #[test]
    fn test_warnings_are_not_errors() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Heads up", "something odd");
        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);

        assert!(diags.check().is_ok());
    }

    #[test]
    fn test_extend_and_display() {
        let mut diags = Diagnostics::new();
        diags.add_error("First", "one");
        let mut more = Diagnostics::new();
        more.add_error("Second", "two");
        diags.extend(more);

        assert_eq!(diags.errors().count(), 2);
        assert_eq!(diags.to_string(), "First: one\nSecond: two");
        assert!(diags.check().is_err());
    }
}
