//! xdiag Client - X API v2 over HTTP
//!
//! Implements [`xdiag_core::ApiClient`] with `reqwest`:
//! - App-only bearer auth and OAuth 1.0a HMAC-SHA1 user-context signing
//! - Per-endpoint `max_results` clamping
//! - Problem-detail and rate-limit header mapping into [`xdiag_core::ApiError`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod types;

pub use client::XApiClient;
pub use config::{RateLimitInfo, XApiConfig, DEFAULT_BASE_URL};
pub use error::{XApiError, XApiResult};
pub use oauth::OAuthSigner;
