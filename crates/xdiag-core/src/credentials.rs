//! Credential material supplied by the environment
//!
//! A [`CredentialSet`] holds the five token strings the X API hands out to a
//! developer app. Each field is either present (non-empty) or absent; the
//! only validation applied is the advisory length check in
//! [`CredentialSet::hygiene_warnings`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a freshly issued app-only bearer token.
pub const EXPECTED_BEARER_TOKEN_LEN: usize = 112;

/// Access tokens at or below this length are almost always truncated copies.
pub const MIN_ACCESS_TOKEN_LEN: usize = 45;

/// A token string that is wiped from memory when dropped
///
/// Debug and Display never print the value.
///
/// # Example
///
/// ```
/// use xdiag_core::credentials::SecretToken;
///
/// let token = SecretToken::new("AAAA-bearer");
/// assert_eq!(token.expose(), "AAAA-bearer");
/// assert!(!format!("{:?}", token).contains("AAAA"));
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretToken {
    inner: String,
}

impl SecretToken {
    /// Wrap a token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Borrow the raw value. Keep the borrow short-lived.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretToken([REDACTED, {} bytes])", self.inner.len())
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretToken {
    fn eq(&self, other: &Self) -> bool {
        self.inner.as_bytes().ct_eq(other.inner.as_bytes()).into()
    }
}

impl Eq for SecretToken {}

/// The named credential fields an X developer app can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    /// Consumer key
    ApiKey,
    /// Consumer secret
    ApiSecret,
    /// App-only bearer token
    BearerToken,
    /// User-context access token
    AccessToken,
    /// User-context access token secret
    AccessTokenSecret,
}

impl CredentialField {
    /// Every field, in display order.
    pub const ALL: [CredentialField; 5] = [
        CredentialField::ApiKey,
        CredentialField::ApiSecret,
        CredentialField::BearerToken,
        CredentialField::AccessToken,
        CredentialField::AccessTokenSecret,
    ];

    /// The four fields that together make up OAuth 1.0a user-context material.
    pub const USER_CONTEXT: [CredentialField; 4] = [
        CredentialField::ApiKey,
        CredentialField::ApiSecret,
        CredentialField::AccessToken,
        CredentialField::AccessTokenSecret,
    ];

    /// Environment variable the field is read from.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::ApiKey => "TWITTER_API_KEY",
            Self::ApiSecret => "TWITTER_API_SECRET",
            Self::BearerToken => "TWITTER_BEARER_TOKEN",
            Self::AccessToken => "TWITTER_ACCESS_TOKEN",
            Self::AccessTokenSecret => "TWITTER_ACCESS_TOKEN_SECRET",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApiKey => "API key",
            Self::ApiSecret => "API secret",
            Self::BearerToken => "bearer token",
            Self::AccessToken => "access token",
            Self::AccessTokenSecret => "access token secret",
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Four-part OAuth 1.0a user-context credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// Consumer key
    pub app_key: SecretToken,
    /// Consumer secret
    pub app_secret: SecretToken,
    /// Access token
    pub access_token: SecretToken,
    /// Access token secret
    pub access_secret: SecretToken,
}

/// Presence summary for one field. Never carries the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldStatus {
    /// Which field
    pub field: CredentialField,
    /// Length of the value, `None` when absent
    pub length: Option<usize>,
}

impl FieldStatus {
    /// Whether the field is set.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.length.is_some()
    }
}

/// Named credentials handed to the diagnostic runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    tokens: BTreeMap<CredentialField, SecretToken>,
}

impl CredentialSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every field from its `TWITTER_*` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a set by resolving each field's environment variable name.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut set = Self::new();
        for field in CredentialField::ALL {
            if let Some(value) = lookup(field.env_var()) {
                set.insert(field, value);
            }
        }
        set
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, field: CredentialField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field. An empty value leaves the field absent.
    pub fn insert(&mut self, field: CredentialField, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.tokens.remove(&field);
        } else {
            self.tokens.insert(field, SecretToken::new(value));
        }
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, field: CredentialField) -> Option<&SecretToken> {
        self.tokens.get(&field)
    }

    /// Whether a field is present.
    #[must_use]
    pub fn contains(&self, field: CredentialField) -> bool {
        self.tokens.contains_key(&field)
    }

    /// The subset of `fields` that is absent, in the given order.
    #[must_use]
    pub fn missing(&self, fields: &[CredentialField]) -> Vec<CredentialField> {
        fields
            .iter()
            .copied()
            .filter(|field| !self.contains(*field))
            .collect()
    }

    /// App-only bearer token, if present.
    #[must_use]
    pub fn bearer(&self) -> Option<&SecretToken> {
        self.get(CredentialField::BearerToken)
    }

    /// All four user-context fields, or `None` if any one is missing.
    #[must_use]
    pub fn user_context(&self) -> Option<OAuthCredentials> {
        Some(OAuthCredentials {
            app_key: self.get(CredentialField::ApiKey)?.clone(),
            app_secret: self.get(CredentialField::ApiSecret)?.clone(),
            access_token: self.get(CredentialField::AccessToken)?.clone(),
            access_secret: self.get(CredentialField::AccessTokenSecret)?.clone(),
        })
    }

    /// Presence and length of every field, in display order.
    #[must_use]
    pub fn field_status(&self) -> Vec<FieldStatus> {
        CredentialField::ALL
            .iter()
            .map(|field| FieldStatus {
                field: *field,
                length: self.get(*field).map(SecretToken::len),
            })
            .collect()
    }

    /// Advisory warnings from token length heuristics.
    #[must_use]
    pub fn hygiene_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(bearer) = self.bearer() {
            if bearer.len() != EXPECTED_BEARER_TOKEN_LEN {
                warnings.push(format!(
                    "bearer token is {} chars (expected {}); it may be truncated or URL-encoded",
                    bearer.len(),
                    EXPECTED_BEARER_TOKEN_LEN
                ));
            }
        }

        if let Some(token) = self.get(CredentialField::AccessToken) {
            if token.len() <= MIN_ACCESS_TOKEN_LEN {
                warnings.push(format!(
                    "access token is only {} chars; regenerate it in the developer portal",
                    token.len()
                ));
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set() -> CredentialSet {
        CredentialSet::new()
            .with(CredentialField::ApiKey, "key")
            .with(CredentialField::ApiSecret, "secret")
            .with(CredentialField::BearerToken, "b".repeat(112))
            .with(CredentialField::AccessToken, "a".repeat(50))
            .with(CredentialField::AccessTokenSecret, "s")
    }

    #[test]
    fn test_empty_value_is_absent() {
        let set = CredentialSet::new().with(CredentialField::BearerToken, "");
        assert!(!set.contains(CredentialField::BearerToken));
        assert!(set.bearer().is_none());
    }

    #[test]
    fn test_from_lookup_reads_env_names() {
        let set = CredentialSet::from_lookup(|name| match name {
            "TWITTER_BEARER_TOKEN" => Some("T".to_string()),
            "TWITTER_API_KEY" => Some(String::new()),
            _ => None,
        });

        assert!(set.contains(CredentialField::BearerToken));
        assert!(!set.contains(CredentialField::ApiKey));
        assert_eq!(set.bearer().map(SecretToken::expose), Some("T"));
    }

    #[test]
    fn test_user_context_requires_all_four() {
        assert!(full_set().user_context().is_some());

        let mut partial = full_set();
        partial.insert(CredentialField::AccessTokenSecret, "");
        assert!(partial.user_context().is_none());
        assert_eq!(
            partial.missing(&CredentialField::USER_CONTEXT),
            vec![CredentialField::AccessTokenSecret]
        );
    }

    #[test]
    fn test_field_status_hides_values() {
        let set = CredentialSet::new().with(CredentialField::ApiKey, "12345");
        let status = set.field_status();

        assert_eq!(status.len(), 5);
        assert_eq!(status[0].length, Some(5));
        assert!(!status[2].is_present());
        let rendered = format!("{:?}", set);
        assert!(!rendered.contains("12345"));
    }

    #[test]
    fn test_hygiene_warnings() {
        assert!(full_set().hygiene_warnings().is_empty());

        let set = CredentialSet::new()
            .with(CredentialField::BearerToken, "short")
            .with(CredentialField::AccessToken, "a".repeat(45));
        let warnings = set.hygiene_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("expected 112"));
        assert!(warnings[1].contains("regenerate"));
    }

    #[test]
    fn test_absent_fields_have_no_hygiene_warning() {
        assert!(CredentialSet::new().hygiene_warnings().is_empty());
    }

    #[test]
    fn test_secret_token_display_redacted() {
        let token = SecretToken::new("super-secret");
        assert_eq!(token.to_string(), "[REDACTED]");
        assert_eq!(token, SecretToken::new("super-secret"));
        assert_ne!(token, SecretToken::new("other"));
    }
}
