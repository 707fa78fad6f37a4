//! xdiag Core - Credential Diagnostic Runner
//!
//! This crate checks a set of X API credentials against a fixed sequence of
//! capability probes:
//! - Credentials: named tokens from the environment, redacted in logs
//! - Client: the [`ApiClient`] abstraction the probes call through
//! - Probes: user lookup, recent search, timelines, following list, "who am I"
//! - Runner: sequential fold producing a [`DiagnosticReport`]
//! - Tier: advisory access-tier guess from probe outcomes
//! - Render: deterministic text report with remediation hints
//! - Artifact: optional JSON digest of fetched posts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod artifact;
pub mod client;
pub mod credentials;
pub mod error;
pub mod probe;
pub mod render;
pub mod report;
pub mod runner;
pub mod scripted;
pub mod tier;

pub use artifact::{write_sample_artifact, SampleArtifact};
pub use client::{
    ApiClient, ApiError, Auth, AuthMode, Post, PostPage, SearchQuery, TimelineQuery, UserProfile,
};
pub use credentials::{CredentialField, CredentialSet, OAuthCredentials, SecretToken};
pub use error::{Error, Result};
pub use probe::{
    Capability, FailureKind, Outcome, PostSample, Probe, ProbePlan, ProbeResult, RunContext,
};
pub use render::{render_credentials, render_report, render_samples};
pub use report::{DiagnosticReport, ReportSummary};
pub use runner::run_diagnostics;
pub use scripted::ScriptedClient;
pub use tier::{classify_access_tier, AccessTier, AccessTierGuess};
