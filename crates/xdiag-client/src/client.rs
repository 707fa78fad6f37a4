//! X API v2 REST client
//!
//! One GET per capability, no retries: a failed call is a diagnostic result,
//! not something to paper over.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use xdiag_core::{ApiClient, ApiError, Auth, PostPage, SearchQuery, TimelineQuery, UserProfile};

use crate::config::{RateLimitInfo, XApiConfig};
use crate::error::{XApiError, XApiResult};
use crate::oauth::{percent_encode, OAuthSigner};
use crate::types::{into_post_page, Envelope, Problem, Tweet, User};

/// Accepted `max_results` for recent search.
pub const SEARCH_RESULTS_RANGE: (u32, u32) = (10, 100);
/// Accepted `max_results` for user timelines.
pub const TIMELINE_RESULTS_RANGE: (u32, u32) = (5, 100);
/// Accepted `max_results` for following lists.
pub const FOLLOWING_RESULTS_RANGE: (u32, u32) = (1, 1000);

const USER_FIELDS: &str = "public_metrics";
const TWEET_FIELDS: &str = "author_id,created_at,public_metrics";

/// X API v2 client.
#[derive(Debug, Clone)]
pub struct XApiClient {
    client: Client,
    base_url: String,
}

impl XApiClient {
    /// Build a client. Fails on an unusable base URL or TLS setup.
    pub fn new(config: XApiConfig) -> XApiResult<Self> {
        let parsed = Url::parse(&config.base_url).map_err(|e| {
            XApiError::Config(format!("invalid base_url {:?}: {}", config.base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(XApiError::Config(format!(
                "base_url must be http or https, got {:?}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Host requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, auth, params), fields(mode = ?auth.mode()))]
    async fn get<T: DeserializeOwned>(
        &self,
        auth: &Auth,
        endpoint: &str,
        params: &[(String, String)],
    ) -> XApiResult<Envelope<T>> {
        let url = format!("{}{}", self.base_url, endpoint);

        let authorization = match auth {
            Auth::Bearer(token) => format!("Bearer {}", token.expose()),
            Auth::UserContext(credentials) => {
                OAuthSigner::new(credentials).sign("GET", &url, params)?
            }
        };

        // Encoded the same way the OAuth signature base is.
        let full_url = if params.is_empty() {
            url
        } else {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            format!("{}?{}", url, query)
        };

        debug!("Sending X API request");
        let response = self
            .client
            .get(&full_url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        handle_response(response).await
    }

    async fn fetch_user(&self, auth: &Auth, handle: &str) -> XApiResult<UserProfile> {
        let endpoint = format!("/2/users/by/username/{}", percent_encode(handle));
        let envelope: Envelope<User> = self.get(auth, &endpoint, &user_fields()).await?;
        require_data(envelope).map(UserProfile::from)
    }

    async fn fetch_search(&self, auth: &Auth, query: &SearchQuery) -> XApiResult<PostPage> {
        let params = vec![
            ("query".to_string(), query.query.clone()),
            (
                "max_results".to_string(),
                clamp_results(query.max_results, SEARCH_RESULTS_RANGE).to_string(),
            ),
            ("tweet.fields".to_string(), TWEET_FIELDS.to_string()),
            ("expansions".to_string(), "author_id".to_string()),
            ("user.fields".to_string(), "username,name".to_string()),
        ];
        let envelope: Envelope<Vec<Tweet>> =
            self.get(auth, "/2/tweets/search/recent", &params).await?;
        reject_error_only(&envelope)?;
        Ok(into_post_page(envelope, query.max_results as usize))
    }

    async fn fetch_timeline(
        &self,
        auth: &Auth,
        user_id: &str,
        query: &TimelineQuery,
    ) -> XApiResult<PostPage> {
        let mut params = vec![
            (
                "max_results".to_string(),
                clamp_results(query.max_results, TIMELINE_RESULTS_RANGE).to_string(),
            ),
            ("tweet.fields".to_string(), TWEET_FIELDS.to_string()),
        ];

        let exclude: Vec<&str> = [
            (query.exclude_replies, "replies"),
            (query.exclude_reshares, "retweets"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        if !exclude.is_empty() {
            params.push(("exclude".to_string(), exclude.join(",")));
        }

        let endpoint = format!("/2/users/{}/tweets", percent_encode(user_id));
        let envelope: Envelope<Vec<Tweet>> = self.get(auth, &endpoint, &params).await?;
        reject_error_only(&envelope)?;
        Ok(into_post_page(envelope, query.max_results as usize))
    }

    async fn fetch_following(
        &self,
        auth: &Auth,
        user_id: &str,
        max_results: u32,
    ) -> XApiResult<Vec<UserProfile>> {
        let mut params = user_fields();
        params.push((
            "max_results".to_string(),
            clamp_results(max_results, FOLLOWING_RESULTS_RANGE).to_string(),
        ));

        let endpoint = format!("/2/users/{}/following", percent_encode(user_id));
        let envelope: Envelope<Vec<User>> = self.get(auth, &endpoint, &params).await?;
        reject_error_only(&envelope)?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .take(max_results as usize)
            .map(UserProfile::from)
            .collect())
    }

    async fn fetch_me(&self, auth: &Auth) -> XApiResult<UserProfile> {
        let envelope: Envelope<User> = self.get(auth, "/2/users/me", &user_fields()).await?;
        require_data(envelope).map(UserProfile::from)
    }
}

fn user_fields() -> Vec<(String, String)> {
    vec![("user.fields".to_string(), USER_FIELDS.to_string())]
}

/// Clamp a requested count into an endpoint's accepted range.
#[must_use]
pub fn clamp_results(requested: u32, (min, max): (u32, u32)) -> u32 {
    requested.clamp(min, max)
}

fn unix_now() -> Option<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> XApiResult<Envelope<T>> {
    let status = response.status();

    let rate_limit = RateLimitInfo::from_headers(response.headers());
    if rate_limit.is_exhausted() {
        debug!(reset = ?rate_limit.reset, "Rate limit exhausted");
    }

    let bytes = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&bytes).map_err(XApiError::from);
    }

    let message = serde_json::from_slice::<Problem>(&bytes)
        .ok()
        .and_then(|problem| problem.message())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
        unix_now().and_then(|now| rate_limit.secs_until_reset(now))
    } else {
        None
    };

    Err(XApiError::Api {
        status: status.as_u16(),
        message,
        retry_after,
    })
}

fn first_error(errors: Option<&[Problem]>) -> Option<String> {
    errors.and_then(|errors| errors.iter().find_map(Problem::message))
}

/// A 200 with no `data` but an `errors` array is a lookup miss.
fn reject_error_only<T>(envelope: &Envelope<T>) -> XApiResult<()> {
    match (&envelope.data, envelope.errors.as_deref()) {
        (None, Some(errors)) if !errors.is_empty() => Err(XApiError::NotFound(
            first_error(Some(errors)).unwrap_or_else(|| "resource not found".to_string()),
        )),
        _ => Ok(()),
    }
}

fn require_data<T>(envelope: Envelope<T>) -> XApiResult<T> {
    match envelope.data {
        Some(data) => Ok(data),
        None => Err(XApiError::NotFound(
            first_error(envelope.errors.as_deref())
                .unwrap_or_else(|| "response carried no data".to_string()),
        )),
    }
}

#[async_trait]
impl ApiClient for XApiClient {
    async fn lookup_user_by_handle(
        &self,
        auth: &Auth,
        handle: &str,
    ) -> Result<UserProfile, ApiError> {
        Ok(self.fetch_user(auth, handle).await?)
    }

    async fn search_recent_posts(
        &self,
        auth: &Auth,
        query: &SearchQuery,
    ) -> Result<PostPage, ApiError> {
        Ok(self.fetch_search(auth, query).await?)
    }

    async fn list_user_posts(
        &self,
        auth: &Auth,
        user_id: &str,
        query: &TimelineQuery,
    ) -> Result<PostPage, ApiError> {
        Ok(self.fetch_timeline(auth, user_id, query).await?)
    }

    async fn list_followed_accounts(
        &self,
        auth: &Auth,
        user_id: &str,
        max_results: u32,
    ) -> Result<Vec<UserProfile>, ApiError> {
        Ok(self.fetch_following(auth, user_id, max_results).await?)
    }

    async fn get_authenticated_identity(&self, auth: &Auth) -> Result<UserProfile, ApiError> {
        Ok(self.fetch_me(auth).await?)
    }
}
