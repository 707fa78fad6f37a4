//! Text rendering for reports, credential overviews and post excerpts
//!
//! Output is deterministic: the same report always renders to the same
//! bytes.

use std::fmt::Write as _;

use crate::credentials::CredentialSet;
use crate::probe::{Outcome, PostSample, ProbeResult};
use crate::report::DiagnosticReport;
use crate::tier::classify_access_tier;

/// Remediation hints keyed by remote error code, in display order.
pub const HINTS: &[(u16, &str)] = &[
    (
        429,
        "Rate limit hit: wait 15 minutes for the window to reset before running again.",
    ),
    (
        403,
        "Access forbidden: recent search needs Basic tier or higher, and user-scoped \
         endpoints need OAuth 1.0a user-context credentials. Check the app's tier and permissions.",
    ),
    (
        401,
        "Credentials rejected: tokens are invalid or expired. Regenerate them in the X Developer Portal.",
    ),
];

/// Maximum characters of post text shown in excerpts.
pub const EXCERPT_CHARS: usize = 100;

/// Hint for a remote error code, if one exists.
#[must_use]
pub fn hint_for(code: u16) -> Option<&'static str> {
    HINTS
        .iter()
        .find(|(hint_code, _)| *hint_code == code)
        .map(|(_, hint)| *hint)
}

fn heading(out: &mut String, title: &str, underline: char) {
    out.push_str(title);
    out.push('\n');
    out.extend(std::iter::repeat(underline).take(title.chars().count()));
    out.push('\n');
}

fn status_line(result: &ProbeResult) -> String {
    match result.outcome {
        Outcome::Success => format!(
            "[PASS] {}: {}",
            result.probe_name,
            result.detail.as_deref().unwrap_or("ok")
        ),
        Outcome::Failure(kind) => {
            let tag = if kind.is_skip() { "SKIP" } else { "FAIL" };
            let mut line = format!("[{}] {}: {}", tag, result.probe_name, kind.label());
            if let Some(code) = result.error_code {
                let _ = write!(line, " ({})", code);
            }
            if let Some(detail) = result.detail.as_deref() {
                if detail != kind.label() {
                    let _ = write!(line, " - {}", detail);
                }
            }
            line
        }
    }
}

/// Render a report: status lines, count line, tier guess, hints.
#[must_use]
pub fn render_report(report: &DiagnosticReport) -> String {
    let mut out = String::new();
    heading(&mut out, "X API Diagnostic Report", '=');

    if let Some(reason) = report.abort_reason() {
        let _ = writeln!(out, "[FAIL] diagnostics aborted: {}", reason);
        out.push('\n');
        out.push_str("Result: 0/0 probes succeeded\n");
        return out;
    }

    for result in report.results() {
        out.push_str(&status_line(result));
        out.push('\n');
    }

    let summary = report.summary();
    out.push('\n');
    let _ = writeln!(
        out,
        "Result: {}/{} probes succeeded ({} failed, {} skipped)",
        summary.successes, summary.total, summary.failures, summary.skipped
    );

    let guess = classify_access_tier(report.results());
    let _ = writeln!(out, "Access tier guess: {} ({})", guess.tier, guess.rationale);

    let codes = report.error_codes();
    let hints: Vec<_> = HINTS
        .iter()
        .filter(|(code, _)| codes.contains(code))
        .collect();
    if !hints.is_empty() {
        out.push('\n');
        out.push_str("Hints:\n");
        for (code, hint) in hints {
            let _ = writeln!(out, "  - [{}] {}", code, hint);
        }
    }

    out
}

/// Render which credential fields are set, plus hygiene warnings.
#[must_use]
pub fn render_credentials(credentials: &CredentialSet) -> String {
    let mut out = String::new();
    heading(&mut out, "Credentials", '-');

    for status in credentials.field_status() {
        match status.length {
            Some(len) => {
                let _ = writeln!(out, "  [x] {}: {} chars", status.field.env_var(), len);
            }
            None => {
                let _ = writeln!(out, "  [ ] {}: NOT SET", status.field.env_var());
            }
        }
    }

    for warning in credentials.hygiene_warnings() {
        let _ = writeln!(out, "  ! {}", warning);
    }

    out
}

/// Truncate to at most `max_chars` characters, marking the cut.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= max_chars {
        flattened
    } else {
        let cut: String = flattened.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Render up to `limit` fetched posts.
#[must_use]
pub fn render_samples(samples: &[PostSample], limit: usize) -> String {
    let mut out = String::new();
    if samples.is_empty() {
        return out;
    }

    heading(&mut out, "Sample posts", '-');
    for (i, sample) in samples.iter().take(limit).enumerate() {
        let _ = writeln!(out, "{}. @{} via {}", i + 1, sample.author, sample.source);
        let _ = writeln!(out, "   {}", excerpt(&sample.text, EXCERPT_CHARS));
        let _ = writeln!(out, "   engagement: {}", sample.engagement);
    }
    out
}
