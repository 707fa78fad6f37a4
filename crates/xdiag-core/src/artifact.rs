//! JSON sample artifact
//!
//! A small digest of the posts fetched during a run, written next to other
//! runs' digests. The filename carries a millisecond timestamp so repeated
//! runs never overwrite each other.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::report::DiagnosticReport;

/// Posts kept in the artifact.
pub const ARTIFACT_TOP_POSTS: usize = 5;

/// One post in the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPost {
    /// Author handle
    pub author: String,
    /// Post text
    pub text: String,
    /// Likes plus reposts
    pub engagement: u64,
}

/// The artifact document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleArtifact {
    /// Document title
    pub title: String,
    /// When the artifact was generated (RFC 3339)
    pub generated_at: String,
    /// Number of posts fetched during the run
    pub sources: usize,
    /// First posts fetched, in run order
    pub top_posts: Vec<ArtifactPost>,
}

impl SampleArtifact {
    /// Build the artifact for a report.
    #[must_use]
    pub fn from_report(report: &DiagnosticReport, title: &str, now: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            generated_at: now.to_rfc3339(),
            sources: report.samples().len(),
            top_posts: report
                .samples()
                .iter()
                .take(ARTIFACT_TOP_POSTS)
                .map(|sample| ArtifactPost {
                    author: sample.author.clone(),
                    text: sample.text.clone(),
                    engagement: sample.engagement,
                })
                .collect(),
        }
    }
}

/// Artifact filename for a point in time.
#[must_use]
pub fn artifact_file_name(now: DateTime<Utc>) -> String {
    format!("diagnostic-sample-{}.json", now.timestamp_millis())
}

/// Write the sample artifact into `dir`, creating it if needed.
///
/// Returns `None` without touching the filesystem when the run fetched no
/// posts.
pub fn write_sample_artifact(
    dir: &Path,
    report: &DiagnosticReport,
    title: &str,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    if report.samples().is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dir).map_err(|source| Error::Artifact {
        path: dir.to_path_buf(),
        source,
    })?;

    let artifact = SampleArtifact::from_report(report, title, now);
    let path = dir.join(artifact_file_name(now));
    let content = serde_json::to_string_pretty(&artifact)?;

    fs::write(&path, content).map_err(|source| Error::Artifact {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), posts = artifact.top_posts.len(), "Sample artifact written");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::PostSample;
    use chrono::TimeZone;

    fn report_with_samples(n: u64) -> DiagnosticReport {
        let mut report = DiagnosticReport::new();
        report.extend_samples((0..n).map(|i| PostSample {
            source: "search:\"ai\"".into(),
            author: format!("user{}", i),
            text: format!("post {}", i),
            engagement: i * 10,
        }));
        report
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn test_artifact_keeps_top_posts() {
        let artifact =
            SampleArtifact::from_report(&report_with_samples(8), "Daily Brief", fixed_now());
        assert_eq!(artifact.sources, 8);
        assert_eq!(artifact.top_posts.len(), ARTIFACT_TOP_POSTS);
        assert_eq!(artifact.top_posts[0].author, "user0");
        assert_eq!(artifact.generated_at, "2026-10-16T12:00:00+00:00");
    }

    #[test]
    fn test_write_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");

        let path = write_sample_artifact(&dir, &report_with_samples(2), "Brief", fixed_now())
            .unwrap()
            .unwrap();

        assert!(path.starts_with(&dir));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(artifact_file_name(fixed_now()).as_str())
        );
        let written: SampleArtifact =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.top_posts.len(), 2);
    }

    #[test]
    fn test_no_samples_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("unused");

        let written =
            write_sample_artifact(&dir, &DiagnosticReport::new(), "Brief", fixed_now()).unwrap();

        assert!(written.is_none());
        assert!(!dir.exists());
    }
}
