//! Diagnostic report

use serde::Serialize;

use crate::probe::{PostSample, ProbeResult};

/// Counts derived from a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Probes run
    pub total: usize,
    /// Probes that succeeded
    pub successes: usize,
    /// Probes that reached the remote service and failed
    pub failures: usize,
    /// Probes skipped without a remote call
    pub skipped: usize,
}

/// Ordered probe results for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    results: Vec<ProbeResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    samples: Vec<PostSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aborted: Option<String>,
}

impl DiagnosticReport {
    /// An empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A report for a run that could not start at all.
    #[must_use]
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self {
            aborted: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Append a probe result.
    pub fn push(&mut self, result: ProbeResult) {
        self.results.push(result);
    }

    /// Keep fetched posts for the sample artifact.
    pub fn extend_samples(&mut self, samples: impl IntoIterator<Item = PostSample>) {
        self.samples.extend(samples);
    }

    /// Results in probe declaration order.
    #[must_use]
    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    /// Posts fetched during the run.
    #[must_use]
    pub fn samples(&self) -> &[PostSample] {
        &self.samples
    }

    /// Why the run aborted, if it did.
    #[must_use]
    pub fn abort_reason(&self) -> Option<&str> {
        self.aborted.as_deref()
    }

    /// Success, failure and skip counts.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.results.len(),
            ..ReportSummary::default()
        };

        for result in &self.results {
            match result.failure_kind() {
                None => summary.successes += 1,
                Some(kind) if kind.is_skip() => summary.skipped += 1,
                Some(_) => summary.failures += 1,
            }
        }

        summary
    }

    /// Distinct remote error codes, in first-seen order.
    #[must_use]
    pub fn error_codes(&self) -> Vec<u16> {
        let mut codes = Vec::new();
        for code in self.results.iter().filter_map(|r| r.error_code) {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        codes
    }

    /// Whether the run aborted or any probe failed remotely.
    ///
    /// Skipped probes do not count: absent credentials are valid input.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.aborted.is_some() || self.summary().failures > 0
    }

    /// Process exit code for this report.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_failures())
    }
}
