//! API client abstraction
//!
//! The runner talks to the remote service only through [`ApiClient`]. The
//! concrete protocol (HTTP, auth headers, rate-limit headers) lives in the
//! implementation; probes only see payloads and [`ApiError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::{CredentialField, CredentialSet, OAuthCredentials, SecretToken};

/// Which kind of auth material a call is made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Bearer token only
    AppOnly,
    /// OAuth 1.0a, acting as the account that owns the access token
    UserContext,
}

impl AuthMode {
    /// Fields that must be present to authenticate in this mode.
    #[must_use]
    pub const fn required_fields(self) -> &'static [CredentialField] {
        match self {
            Self::AppOnly => &[CredentialField::BearerToken],
            Self::UserContext => &CredentialField::USER_CONTEXT,
        }
    }
}

/// Auth material for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// App-only bearer token
    Bearer(SecretToken),
    /// Four-part user-context credentials
    UserContext(OAuthCredentials),
}

impl Auth {
    /// Build auth for `mode` from a credential set, `None` if material is missing.
    #[must_use]
    pub fn from_credentials(mode: AuthMode, credentials: &CredentialSet) -> Option<Self> {
        match mode {
            AuthMode::AppOnly => credentials.bearer().cloned().map(Self::Bearer),
            AuthMode::UserContext => credentials.user_context().map(Self::UserContext),
        }
    }

    /// The mode this material authenticates in.
    #[must_use]
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::Bearer(_) => AuthMode::AppOnly,
            Self::UserContext(_) => AuthMode::UserContext,
        }
    }
}

/// Error returned by the remote service or the transport in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status, `None` for transport failures
    pub status: Option<u16>,
    /// Remote or transport message
    pub message: String,
    /// Seconds until the rate-limit window resets, when known
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    /// Error carrying a remote status code.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            retry_after_secs: None,
        }
    }

    /// Error that never reached the remote service.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    /// Attach a retry hint.
    #[must_use]
    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }
}

/// Public profile of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account id
    pub id: String,
    /// Display name
    pub name: String,
    /// Handle without the leading `@`
    pub username: String,
    /// Follower count, when requested
    #[serde(default)]
    pub followers_count: Option<u64>,
    /// Following count, when requested
    #[serde(default)]
    pub following_count: Option<u64>,
}

/// A single post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post id
    pub id: String,
    /// Body text
    pub text: String,
    /// Author account id
    #[serde(default)]
    pub author_id: Option<String>,
    /// Likes
    #[serde(default)]
    pub like_count: u64,
    /// Reposts
    #[serde(default)]
    pub repost_count: u64,
}

impl Post {
    /// Likes plus reposts.
    #[must_use]
    pub fn engagement(&self) -> u64 {
        self.like_count + self.repost_count
    }
}

/// A page of posts with any expanded authors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPage {
    /// Posts, newest first
    pub posts: Vec<Post>,
    /// Authors expanded alongside the posts
    #[serde(default)]
    pub authors: Vec<UserProfile>,
}

impl PostPage {
    /// Find the expanded author of a post.
    #[must_use]
    pub fn author_of(&self, post: &Post) -> Option<&UserProfile> {
        let author_id = post.author_id.as_deref()?;
        self.authors.iter().find(|user| user.id == author_id)
    }
}

/// Keyword search over recent posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Search expression
    pub query: String,
    /// Upper bound on returned posts
    pub max_results: u32,
}

/// Per-account timeline fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineQuery {
    /// Upper bound on returned posts
    pub max_results: u32,
    /// Leave out replies
    pub exclude_replies: bool,
    /// Leave out reposts
    pub exclude_reshares: bool,
}

/// Remote capabilities the diagnostic probes exercise.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Resolve an account by handle.
    async fn lookup_user_by_handle(&self, auth: &Auth, handle: &str)
        -> Result<UserProfile, ApiError>;

    /// Search recent posts.
    async fn search_recent_posts(&self, auth: &Auth, query: &SearchQuery)
        -> Result<PostPage, ApiError>;

    /// Fetch an account's recent posts.
    async fn list_user_posts(
        &self,
        auth: &Auth,
        user_id: &str,
        query: &TimelineQuery,
    ) -> Result<PostPage, ApiError>;

    /// Fetch the accounts an account follows.
    async fn list_followed_accounts(
        &self,
        auth: &Auth,
        user_id: &str,
        max_results: u32,
    ) -> Result<Vec<UserProfile>, ApiError>;

    /// Identify the account behind user-context credentials.
    async fn get_authenticated_identity(&self, auth: &Auth) -> Result<UserProfile, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_from_credentials() {
        let bearer_only = CredentialSet::new().with(CredentialField::BearerToken, "T");

        let auth = Auth::from_credentials(AuthMode::AppOnly, &bearer_only);
        assert_eq!(auth.map(|a| a.mode()), Some(AuthMode::AppOnly));
        assert!(Auth::from_credentials(AuthMode::UserContext, &bearer_only).is_none());
    }

    #[test]
    fn test_author_lookup() {
        let page = PostPage {
            posts: vec![Post {
                id: "1".into(),
                text: "hello".into(),
                author_id: Some("42".into()),
                like_count: 3,
                repost_count: 2,
            }],
            authors: vec![UserProfile {
                id: "42".into(),
                name: "Forty Two".into(),
                username: "fortytwo".into(),
                followers_count: None,
                following_count: None,
            }],
        };

        let author = page.author_of(&page.posts[0]).map(|u| u.username.as_str());
        assert_eq!(author, Some("fortytwo"));
        assert_eq!(page.posts[0].engagement(), 5);
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::new(429, "Too Many Requests").with_retry_after(900);
        assert_eq!(err.to_string(), "Too Many Requests");
        assert_eq!(err.retry_after_secs, Some(900));
        assert_eq!(ApiError::transport("connection reset").status, None);
    }
}
