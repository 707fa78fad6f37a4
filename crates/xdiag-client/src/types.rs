//! X API v2 wire types

use serde::Deserialize;
use xdiag_core::{Post, PostPage, UserProfile};

/// Standard v2 response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Primary payload, absent on partial errors or empty results
    pub data: Option<T>,

    /// Expanded objects
    #[serde(default)]
    pub includes: Option<Includes>,

    /// Partial errors
    #[serde(default)]
    pub errors: Option<Vec<Problem>>,
}

/// Objects expanded alongside the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    /// Expanded users
    #[serde(default)]
    pub users: Vec<User>,
}

/// A v2 user object.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// User id
    pub id: String,
    /// Display name
    pub name: String,
    /// Handle
    pub username: String,
    /// Counters, when `user.fields=public_metrics`
    #[serde(default)]
    pub public_metrics: Option<UserMetrics>,
}

/// User counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetrics {
    /// Followers
    #[serde(default)]
    pub followers_count: u64,
    /// Accounts followed
    #[serde(default)]
    pub following_count: u64,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            followers_count: user.public_metrics.as_ref().map(|m| m.followers_count),
            following_count: user.public_metrics.as_ref().map(|m| m.following_count),
        }
    }
}

/// A v2 tweet object.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    /// Tweet id
    pub id: String,
    /// Body
    pub text: String,
    /// Author, when `tweet.fields=author_id`
    #[serde(default)]
    pub author_id: Option<String>,
    /// Counters, when `tweet.fields=public_metrics`
    #[serde(default)]
    pub public_metrics: Option<TweetMetrics>,
}

/// Tweet counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TweetMetrics {
    /// Likes
    #[serde(default)]
    pub like_count: u64,
    /// Retweets
    #[serde(default)]
    pub retweet_count: u64,
}

impl From<Tweet> for Post {
    fn from(tweet: Tweet) -> Self {
        let metrics = tweet.public_metrics.unwrap_or_default();
        Self {
            id: tweet.id,
            text: tweet.text,
            author_id: tweet.author_id,
            like_count: metrics.like_count,
            repost_count: metrics.retweet_count,
        }
    }
}

/// Build a page from a tweet list envelope, keeping at most `limit` posts.
pub fn into_post_page(envelope: Envelope<Vec<Tweet>>, limit: usize) -> PostPage {
    PostPage {
        posts: envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .take(limit)
            .map(Post::from)
            .collect(),
        authors: envelope
            .includes
            .map(|includes| includes.users.into_iter().map(UserProfile::from).collect())
            .unwrap_or_default(),
    }
}

/// Problem body, either an RFC 7807 problem or a v1.1-style errors list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Problem {
    /// Short title
    #[serde(default)]
    pub title: Option<String>,
    /// Human-readable detail
    #[serde(default)]
    pub detail: Option<String>,
    /// Legacy message field
    #[serde(default)]
    pub message: Option<String>,
    /// Problem type URI
    #[serde(default, rename = "type")]
    pub problem_type: Option<String>,
    /// Nested errors
    #[serde(default)]
    pub errors: Vec<Problem>,
}

impl Problem {
    /// Best available message.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.detail
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.title.clone())
            .or_else(|| self.errors.iter().find_map(Problem::message))
    }
}
