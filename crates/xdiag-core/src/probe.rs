//! Capability probes
//!
//! A probe is a named, side-effect-free check of one remote capability. The
//! runner takes care of credential short-circuits and error conversion, so
//! a probe only declares what it needs and performs exactly one call.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{
    ApiClient, ApiError, Auth, AuthMode, PostPage, SearchQuery, TimelineQuery, UserProfile,
};
use crate::credentials::CredentialField;

/// Detail recorded when a probe is skipped for lack of credentials.
pub const MISSING_CREDENTIAL_DETAIL: &str = "missing credential";

/// Remote capability a probe exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Single user lookup by handle
    LookupUser,
    /// Keyword search over recent posts
    SearchRecent,
    /// Per-account timeline
    ListPosts,
    /// Following list
    ListFollowing,
    /// "Who am I" with user-context credentials
    AuthenticatedIdentity,
}

/// Why a probe failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required credential field is absent; no call was made
    MissingCredential,
    /// An earlier probe that produces this probe's input did not succeed
    DependencyUnavailable,
    /// Remote 429
    RateLimited,
    /// Remote 403: access tier or auth context is insufficient
    PermissionDenied,
    /// Remote 403 on an endpoint that needs user-context auth
    PermissionRequiresUserContext,
    /// Remote 401: tokens invalid or expired
    Unauthorized,
    /// Anything else, including transport failures
    Unclassified,
}

impl FailureKind {
    /// Map a remote status code onto the taxonomy.
    #[must_use]
    pub const fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(429) => Self::RateLimited,
            Some(403) => Self::PermissionDenied,
            Some(401) => Self::Unauthorized,
            _ => Self::Unclassified,
        }
    }

    /// Whether the probe never reached the remote service.
    #[must_use]
    pub const fn is_skip(self) -> bool {
        matches!(self, Self::MissingCredential | Self::DependencyUnavailable)
    }

    /// Short label used in rendered reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing credential",
            Self::DependencyUnavailable => "dependency unavailable",
            Self::RateLimited => "rate limited",
            Self::PermissionDenied => "permission denied",
            Self::PermissionRequiresUserContext => "requires user context",
            Self::Unauthorized => "unauthorized",
            Self::Unclassified => "error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The capability is reachable with the supplied credentials
    Success,
    /// The capability is not reachable, and why
    Failure(FailureKind),
}

/// Result of a single probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Probe name, including its arguments
    pub probe_name: String,
    /// Capability exercised
    pub capability: Capability,
    /// Success or classified failure
    pub outcome: Outcome,
    /// Short human-readable detail
    pub detail: Option<String>,
    /// Remote status code, for remote failures
    pub error_code: Option<u16>,
}

impl ProbeResult {
    /// A successful probe.
    #[must_use]
    pub fn success(
        probe_name: impl Into<String>,
        capability: Capability,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            probe_name: probe_name.into(),
            capability,
            outcome: Outcome::Success,
            detail: Some(detail.into()),
            error_code: None,
        }
    }

    /// A failed probe.
    #[must_use]
    pub fn failure(
        probe_name: impl Into<String>,
        capability: Capability,
        kind: FailureKind,
        detail: Option<String>,
        error_code: Option<u16>,
    ) -> Self {
        Self {
            probe_name: probe_name.into(),
            capability,
            outcome: Outcome::Failure(kind),
            detail,
            error_code,
        }
    }

    /// A probe skipped because a credential field is absent.
    #[must_use]
    pub fn missing_credential(probe_name: impl Into<String>, capability: Capability) -> Self {
        Self::failure(
            probe_name,
            capability,
            FailureKind::MissingCredential,
            Some(MISSING_CREDENTIAL_DETAIL.to_string()),
            None,
        )
    }

    /// Whether the probe succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// The failure kind, if the probe failed.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.outcome {
            Outcome::Success => None,
            Outcome::Failure(kind) => Some(kind),
        }
    }
}

/// A fetched post kept for the optional sample artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSample {
    /// Where the post came from, e.g. `search:"ai"` or `timeline:@sama`
    pub source: String,
    /// Author handle, `unknown` when not expanded
    pub author: String,
    /// Post text
    pub text: String,
    /// Likes plus reposts
    pub engagement: u64,
}

/// What a successful probe hands back to the runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutput {
    /// Human-readable success detail
    pub detail: String,
    /// Account resolved by this probe, keyed by handle
    pub resolved: Option<(String, UserProfile)>,
    /// Posts fetched by this probe
    pub samples: Vec<PostSample>,
}

impl ProbeOutput {
    /// Output with only a detail line.
    #[must_use]
    pub fn detail(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            ..Self::default()
        }
    }
}

/// Values threaded forward between probes within a run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    resolved: BTreeMap<String, UserProfile>,
}

impl RunContext {
    /// Record an account resolved by an earlier probe.
    pub fn record_user(&mut self, handle: &str, profile: UserProfile) {
        self.resolved.insert(normalize_handle(handle), profile);
    }

    /// An account resolved earlier in the run.
    #[must_use]
    pub fn resolved(&self, handle: &str) -> Option<&UserProfile> {
        self.resolved.get(&normalize_handle(handle))
    }

    fn require(&self, handle: &str) -> Result<&UserProfile, ApiError> {
        self.resolved(handle).ok_or_else(|| {
            ApiError::transport(format!(
                "@{} was not resolved earlier in the run",
                normalize_handle(handle)
            ))
        })
    }
}

/// Canonical form of a handle: no leading `@`, lowercase.
#[must_use]
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

/// A named capability check.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Name shown in the report, including arguments.
    fn name(&self) -> String;

    /// Capability exercised.
    fn capability(&self) -> Capability;

    /// How the call authenticates.
    fn auth_mode(&self) -> AuthMode {
        AuthMode::AppOnly
    }

    /// Credential fields that must be present before any call is made.
    fn required_fields(&self) -> &'static [CredentialField] {
        self.auth_mode().required_fields()
    }

    /// Handle that an earlier probe must have resolved.
    fn depends_on(&self) -> Option<&str> {
        None
    }

    /// Perform the single remote call.
    async fn execute(
        &self,
        client: &dyn ApiClient,
        auth: &Auth,
        ctx: &RunContext,
    ) -> Result<ProbeOutput, ApiError>;

    /// Classify a remote failure.
    fn classify(&self, error: &ApiError) -> FailureKind {
        FailureKind::from_status(error.status)
    }

    /// Detail line recorded for a remote failure.
    fn failure_detail(&self, _kind: FailureKind, error: &ApiError) -> String {
        remote_detail(error)
    }
}

/// Remote error message, with the rate-limit reset when the server sent one.
#[must_use]
pub fn remote_detail(error: &ApiError) -> String {
    match error.retry_after_secs {
        Some(secs) => format!("{} (window resets in {}s)", error.message, secs),
        None => error.message.clone(),
    }
}

fn samples_from(page: &PostPage, source: &str, fallback_author: Option<&str>) -> Vec<PostSample> {
    page.posts
        .iter()
        .map(|post| PostSample {
            source: source.to_string(),
            author: page
                .author_of(post)
                .map(|user| user.username.clone())
                .or_else(|| fallback_author.map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string()),
            text: post.text.clone(),
            engagement: post.engagement(),
        })
        .collect()
}

/// Resolve an account by handle.
#[derive(Debug, Clone)]
pub struct ResolveUser {
    handle: String,
}

impl ResolveUser {
    /// Probe for `handle`, with or without the leading `@`.
    #[must_use]
    pub fn new(handle: &str) -> Self {
        Self {
            handle: normalize_handle(handle),
        }
    }
}

#[async_trait]
impl Probe for ResolveUser {
    fn name(&self) -> String {
        format!("resolve_user(@{})", self.handle)
    }

    fn capability(&self) -> Capability {
        Capability::LookupUser
    }

    async fn execute(
        &self,
        client: &dyn ApiClient,
        auth: &Auth,
        _ctx: &RunContext,
    ) -> Result<ProbeOutput, ApiError> {
        let user = client.lookup_user_by_handle(auth, &self.handle).await?;

        let mut detail = format!("{} (@{}) id={}", user.name, user.username, user.id);
        if let Some(followers) = user.followers_count {
            detail.push_str(&format!(" followers={}", followers));
        }

        Ok(ProbeOutput {
            detail,
            resolved: Some((self.handle.clone(), user)),
            samples: Vec::new(),
        })
    }
}

/// Keyword search over recent posts.
#[derive(Debug, Clone)]
pub struct SearchRecent {
    query: String,
    max_results: u32,
}

impl SearchRecent {
    /// Search for `query`, returning at most `max_results` posts.
    #[must_use]
    pub fn new(query: impl Into<String>, max_results: u32) -> Self {
        Self {
            query: query.into(),
            max_results,
        }
    }
}

#[async_trait]
impl Probe for SearchRecent {
    fn name(&self) -> String {
        format!("search_recent({:?}, max={})", self.query, self.max_results)
    }

    fn capability(&self) -> Capability {
        Capability::SearchRecent
    }

    async fn execute(
        &self,
        client: &dyn ApiClient,
        auth: &Auth,
        _ctx: &RunContext,
    ) -> Result<ProbeOutput, ApiError> {
        let query = SearchQuery {
            query: self.query.clone(),
            max_results: self.max_results,
        };
        let page = client.search_recent_posts(auth, &query).await?;

        Ok(ProbeOutput {
            detail: format!("{} posts", page.posts.len()),
            resolved: None,
            samples: samples_from(&page, &format!("search:{:?}", self.query), None),
        })
    }

    fn failure_detail(&self, kind: FailureKind, error: &ApiError) -> String {
        match kind {
            FailureKind::PermissionDenied => format!(
                "recent search requires Basic tier or higher: {}",
                error.message
            ),
            _ => remote_detail(error),
        }
    }
}

/// Recent posts from one account, the fallback when search is unavailable.
#[derive(Debug, Clone)]
pub struct ListRecentPosts {
    handle: String,
    query: TimelineQuery,
}

impl ListRecentPosts {
    /// Timeline probe for `handle`.
    #[must_use]
    pub fn new(
        handle: &str,
        max_results: u32,
        exclude_replies: bool,
        exclude_reshares: bool,
    ) -> Self {
        Self {
            handle: normalize_handle(handle),
            query: TimelineQuery {
                max_results,
                exclude_replies,
                exclude_reshares,
            },
        }
    }
}

#[async_trait]
impl Probe for ListRecentPosts {
    fn name(&self) -> String {
        format!("list_recent_posts(@{}, max={})", self.handle, self.query.max_results)
    }

    fn capability(&self) -> Capability {
        Capability::ListPosts
    }

    fn depends_on(&self) -> Option<&str> {
        Some(self.handle.as_str())
    }

    async fn execute(
        &self,
        client: &dyn ApiClient,
        auth: &Auth,
        ctx: &RunContext,
    ) -> Result<ProbeOutput, ApiError> {
        let user = ctx.require(&self.handle)?;
        let page = client.list_user_posts(auth, &user.id, &self.query).await?;

        let detail = match page.posts.first() {
            Some(latest) => format!(
                "{} recent posts, latest engagement {}",
                page.posts.len(),
                latest.engagement()
            ),
            None => "0 recent posts".to_string(),
        };

        Ok(ProbeOutput {
            detail,
            resolved: None,
            samples: samples_from(
                &page,
                &format!("timeline:@{}", self.handle),
                Some(&user.username),
            ),
        })
    }
}

/// Following list of one account.
#[derive(Debug, Clone)]
pub struct ListFollowedAccounts {
    handle: String,
    max_results: u32,
}

impl ListFollowedAccounts {
    /// Following-list probe for `handle`.
    #[must_use]
    pub fn new(handle: &str, max_results: u32) -> Self {
        Self {
            handle: normalize_handle(handle),
            max_results,
        }
    }
}

#[async_trait]
impl Probe for ListFollowedAccounts {
    fn name(&self) -> String {
        format!("list_followed_accounts(@{}, max={})", self.handle, self.max_results)
    }

    fn capability(&self) -> Capability {
        Capability::ListFollowing
    }

    fn depends_on(&self) -> Option<&str> {
        Some(self.handle.as_str())
    }

    async fn execute(
        &self,
        client: &dyn ApiClient,
        auth: &Auth,
        ctx: &RunContext,
    ) -> Result<ProbeOutput, ApiError> {
        let user = ctx.require(&self.handle)?;
        let accounts = client
            .list_followed_accounts(auth, &user.id, self.max_results)
            .await?;

        Ok(ProbeOutput::detail(format!("{} accounts", accounts.len())))
    }

    fn classify(&self, error: &ApiError) -> FailureKind {
        match FailureKind::from_status(error.status) {
            FailureKind::PermissionDenied => FailureKind::PermissionRequiresUserContext,
            other => other,
        }
    }

    fn failure_detail(&self, kind: FailureKind, error: &ApiError) -> String {
        match kind {
            FailureKind::PermissionRequiresUserContext => format!(
                "following list requires user context (OAuth 1.0a): {}",
                error.message
            ),
            _ => remote_detail(error),
        }
    }
}

/// "Who am I" using the four-part user-context credentials.
#[derive(Debug, Clone, Default)]
pub struct AuthenticatedIdentity;

impl AuthenticatedIdentity {
    /// The identity probe.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for AuthenticatedIdentity {
    fn name(&self) -> String {
        "authenticated_identity".to_string()
    }

    fn capability(&self) -> Capability {
        Capability::AuthenticatedIdentity
    }

    fn auth_mode(&self) -> AuthMode {
        AuthMode::UserContext
    }

    async fn execute(
        &self,
        client: &dyn ApiClient,
        auth: &Auth,
        _ctx: &RunContext,
    ) -> Result<ProbeOutput, ApiError> {
        let me = client.get_authenticated_identity(auth).await?;
        Ok(ProbeOutput::detail(format!("authenticated as @{}", me.username)))
    }

    fn failure_detail(&self, kind: FailureKind, error: &ApiError) -> String {
        match kind {
            FailureKind::Unauthorized => format!(
                "access tokens are invalid or expired: {}",
                error.message
            ),
            _ => remote_detail(error),
        }
    }
}

/// Ordered probe list builder.
///
/// Handle-dependent probes get a `resolve_user` scheduled ahead of them when
/// none is planned yet, so every dependency is produced before it is used.
#[derive(Default)]
pub struct ProbePlan {
    probes: Vec<Box<dyn Probe>>,
    resolving: BTreeSet<String>,
}

impl ProbePlan {
    /// An empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a probe as-is.
    #[must_use]
    pub fn push(mut self, probe: Box<dyn Probe>) -> Self {
        self.probes.push(probe);
        self
    }

    /// Append [`ResolveUser`].
    #[must_use]
    pub fn resolve_user(mut self, handle: &str) -> Self {
        self.resolving.insert(normalize_handle(handle));
        self.push(Box::new(ResolveUser::new(handle)))
    }

    /// Append [`SearchRecent`].
    #[must_use]
    pub fn search_recent(self, query: &str, max_results: u32) -> Self {
        self.push(Box::new(SearchRecent::new(query, max_results)))
    }

    /// Append [`ListRecentPosts`], resolving the handle first if needed.
    #[must_use]
    pub fn list_recent_posts(
        self,
        handle: &str,
        max_results: u32,
        exclude_replies: bool,
        exclude_reshares: bool,
    ) -> Self {
        self.ensure_resolved(handle).push(Box::new(ListRecentPosts::new(
            handle,
            max_results,
            exclude_replies,
            exclude_reshares,
        )))
    }

    /// Append [`ListFollowedAccounts`], resolving the handle first if needed.
    #[must_use]
    pub fn list_followed_accounts(self, handle: &str, max_results: u32) -> Self {
        self.ensure_resolved(handle)
            .push(Box::new(ListFollowedAccounts::new(handle, max_results)))
    }

    /// Append [`AuthenticatedIdentity`].
    #[must_use]
    pub fn authenticated_identity(self) -> Self {
        self.push(Box::new(AuthenticatedIdentity::new()))
    }

    fn ensure_resolved(self, handle: &str) -> Self {
        if self.resolving.contains(&normalize_handle(handle)) {
            self
        } else {
            self.resolve_user(handle)
        }
    }

    /// Number of planned probes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// Whether nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Planned probe names, in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.probes.iter().map(|probe| probe.name()).collect()
    }

    /// The probes, in order.
    #[must_use]
    pub fn into_probes(self) -> Vec<Box<dyn Probe>> {
        self.probes
    }
}
