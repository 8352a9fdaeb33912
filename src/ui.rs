use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use scripts::{Diagnostic, Diagnostics, Severity};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Diagnostics
// ============================================================================

/// One diagnostic as a single line, without colour.
pub fn format_diagnostic(diag: &Diagnostic) -> String {
    let label = match diag.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    let mut line = format!("{label}: {}: {}", diag.summary, diag.detail);
    if let Some(attribute) = &diag.attribute {
        line.push_str(&format!(" [{attribute}]"));
    }
    line
}

/// Print every diagnostic, errors in red and warnings in yellow
pub fn diagnostics(diags: &Diagnostics) {
    for diag in diags.iter() {
        let line = format_diagnostic(diag);
        match diag.severity {
            Severity::Error => eprintln!("      {}", line.red()),
            Severity::Warning => eprintln!("      {}", line.yellow()),
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

/// A progress bar for `len` operations, drawn on stderr
pub fn progress_bar(len: u64, prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template("  {prefix:.cyan} [{bar:30}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_diagnostic() {
        let mut diags = Diagnostics::new();
        diags.add_error("Missing input", "title is required");
        diags.add_warning("Variant mismatch", "expected V2");

        let lines: Vec<_> = diags.iter().map(format_diagnostic).collect();
        assert_eq!(lines[0], "error: Missing input: title is required");
        assert_eq!(lines[1], "warning: Variant mismatch: expected V2");
    }

    #[test]
    fn test_format_diagnostic_with_attribute() {
        let diag = Diagnostic {
            severity: Severity::Error,
            summary: "Missing input".into(),
            detail: "code is required".into(),
            attribute: Some("code".into()),
        };
        assert_eq!(
            format_diagnostic(&diag),
            "error: Missing input: code is required [code]"
        );
    }

    #[test]
    fn test_progress_bar_counts() {
        let pb = progress_bar(3, "Writing scripts");
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.length(), Some(3));
        pb.finish_and_clear();
    }
}
