//! Scripted API client for tests and dry runs
//!
//! Every capability succeeds with deterministic synthetic data unless a
//! failure has been scripted for it. Calls are counted per capability.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{
    ApiClient, ApiError, Auth, Post, PostPage, SearchQuery, TimelineQuery, UserProfile,
};
use crate::probe::Capability;

/// Most items a single scripted call returns, whatever was requested.
pub const SCRIPTED_PAGE_CAP: u32 = 100;

/// Deterministic [`ApiClient`] double.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    failures: BTreeMap<Capability, ApiError>,
    calls: Mutex<BTreeMap<Capability, usize>>,
}

impl ScriptedClient {
    /// A client on which every capability succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `capability` fail with `error`.
    #[must_use]
    pub fn failing(mut self, capability: Capability, error: ApiError) -> Self {
        self.failures.insert(capability, error);
        self
    }

    /// Calls made to `capability` so far.
    #[must_use]
    pub fn calls(&self, capability: Capability) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&capability)
            .copied()
            .unwrap_or(0)
    }

    /// Calls made to any capability so far.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .sum()
    }

    fn enter(&self, capability: Capability) -> Result<(), ApiError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(capability)
            .or_insert(0) += 1;

        match self.failures.get(&capability) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn profile(handle: &str) -> UserProfile {
    UserProfile {
        id: format!("{}-id", handle),
        name: format!("{} (scripted)", handle),
        username: handle.to_string(),
        followers_count: Some(100),
        following_count: Some(10),
    }
}

fn posts(author_id: &str, count: u32) -> Vec<Post> {
    (0..count.min(SCRIPTED_PAGE_CAP))
        .map(|i| Post {
            id: format!("{}-post-{}", author_id, i),
            text: format!("scripted post {} by {}", i, author_id),
            author_id: Some(author_id.to_string()),
            like_count: u64::from(i) * 2,
            repost_count: u64::from(i),
        })
        .collect()
}

#[async_trait]
impl ApiClient for ScriptedClient {
    async fn lookup_user_by_handle(
        &self,
        _auth: &Auth,
        handle: &str,
    ) -> Result<UserProfile, ApiError> {
        self.enter(Capability::LookupUser)?;
        Ok(profile(handle))
    }

    async fn search_recent_posts(
        &self,
        _auth: &Auth,
        query: &SearchQuery,
    ) -> Result<PostPage, ApiError> {
        self.enter(Capability::SearchRecent)?;
        let author = profile("searcher");
        Ok(PostPage {
            posts: posts(&author.id, query.max_results),
            authors: vec![author],
        })
    }

    async fn list_user_posts(
        &self,
        _auth: &Auth,
        user_id: &str,
        query: &TimelineQuery,
    ) -> Result<PostPage, ApiError> {
        self.enter(Capability::ListPosts)?;
        Ok(PostPage {
            posts: posts(user_id, query.max_results),
            authors: Vec::new(),
        })
    }

    async fn list_followed_accounts(
        &self,
        _auth: &Auth,
        _user_id: &str,
        max_results: u32,
    ) -> Result<Vec<UserProfile>, ApiError> {
        self.enter(Capability::ListFollowing)?;
        Ok((0..max_results.min(SCRIPTED_PAGE_CAP))
            .map(|i| profile(&format!("followed{}", i)))
            .collect())
    }

    async fn get_authenticated_identity(&self, _auth: &Auth) -> Result<UserProfile, ApiError> {
        self.enter(Capability::AuthenticatedIdentity)?;
        Ok(profile("me"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::SecretToken;

    fn auth() -> Auth {
        Auth::Bearer(SecretToken::new("T"))
    }

    #[tokio::test]
    async fn test_large_requests_are_capped() {
        let client = ScriptedClient::new();

        let search = SearchQuery {
            query: "ai".to_string(),
            max_results: u32::MAX,
        };
        let page = client.search_recent_posts(&auth(), &search).await.unwrap();
        assert_eq!(page.posts.len(), SCRIPTED_PAGE_CAP as usize);

        let timeline = TimelineQuery {
            max_results: 1_000_000,
            exclude_replies: true,
            exclude_reshares: true,
        };
        let page = client.list_user_posts(&auth(), "1", &timeline).await.unwrap();
        assert_eq!(page.posts.len(), SCRIPTED_PAGE_CAP as usize);

        let followed = client.list_followed_accounts(&auth(), "1", u32::MAX).await.unwrap();
        assert_eq!(followed.len(), SCRIPTED_PAGE_CAP as usize);
    }

    #[tokio::test]
    async fn test_small_requests_are_honoured() {
        let client = ScriptedClient::new();
        let timeline = TimelineQuery {
            max_results: 5,
            exclude_replies: false,
            exclude_reshares: false,
        };

        let page = client.list_user_posts(&auth(), "1", &timeline).await.unwrap();

        assert_eq!(page.posts.len(), 5);
        assert_eq!(client.calls(Capability::ListPosts), 1);
    }
}
