//! User-facing progress output.

use crate::sync::SyncReport;
use std::fmt::Display;
use std::io::Write;

/// Write `message` and a newline to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort progress output; ignore write failures.
    }
}

/// Summarise a finished run in one line.
///
/// # Examples
///
/// ```
/// use circleci_mirror::output::summary_message;
/// use circleci_mirror::sync::SyncReport;
///
/// assert_eq!(summary_message(&SyncReport::default()), "Mirror is up to date");
/// ```
#[must_use]
pub fn summary_message(report: &SyncReport) -> String {
    if report.is_empty() {
        return "Mirror is up to date".to_owned();
    }
    let plural = if report.published.len() == 1 {
        "version"
    } else {
        "versions"
    };
    let mut message = format!("Published {} {plural}", report.published.len());
    if !report.skipped.is_empty() {
        message.push_str(&format!(", skipped {}", report.skipped.len()));
    }
    message
}
