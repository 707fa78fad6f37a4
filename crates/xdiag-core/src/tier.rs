//! Access tier heuristic
//!
//! Advisory only: the guess is printed alongside the report and never gates
//! anything.

use std::fmt;

use serde::Serialize;

use crate::probe::{Capability, FailureKind, ProbeResult};

/// Subscription level of the developer app behind the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    /// No search entitlement
    Free,
    /// Recent search available
    Basic,
    /// Recent search and following list both available
    Elevated,
    /// Not enough evidence
    Unknown,
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Free => "free",
            Self::Basic => "basic",
            Self::Elevated => "elevated",
            Self::Unknown => "unknown",
        })
    }
}

/// A tier guess and the evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessTierGuess {
    /// Guessed tier
    pub tier: AccessTier,
    /// One-line explanation
    pub rationale: String,
}

impl AccessTierGuess {
    fn new(tier: AccessTier, rationale: impl Into<String>) -> Self {
        Self {
            tier,
            rationale: rationale.into(),
        }
    }
}

fn any_with(
    results: &[ProbeResult],
    capability: Capability,
    pred: impl Fn(&ProbeResult) -> bool,
) -> bool {
    results
        .iter()
        .filter(|r| r.capability == capability)
        .any(pred)
}

/// Guess the access tier from which capabilities succeeded or failed.
#[must_use]
pub fn classify_access_tier(results: &[ProbeResult]) -> AccessTierGuess {
    let failed_with = |kind: FailureKind| move |r: &ProbeResult| r.failure_kind() == Some(kind);

    let search_ok = any_with(results, Capability::SearchRecent, ProbeResult::is_success);
    let following_ok = any_with(results, Capability::ListFollowing, ProbeResult::is_success);

    if search_ok && following_ok {
        return AccessTierGuess::new(
            AccessTier::Elevated,
            "recent search and following list are both reachable",
        );
    }
    if search_ok {
        return AccessTierGuess::new(AccessTier::Basic, "recent search is reachable");
    }
    if any_with(results, Capability::SearchRecent, failed_with(FailureKind::RateLimited)) {
        return AccessTierGuess::new(
            AccessTier::Basic,
            "recent search is entitled but currently rate limited",
        );
    }
    if any_with(results, Capability::SearchRecent, failed_with(FailureKind::PermissionDenied)) {
        return AccessTierGuess::new(
            AccessTier::Free,
            "recent search is forbidden (403); it needs Basic tier or higher",
        );
    }
    if results
        .iter()
        .any(|r| r.failure_kind() == Some(FailureKind::Unauthorized))
    {
        return AccessTierGuess::new(
            AccessTier::Unknown,
            "credentials were rejected (401) before the tier could be probed",
        );
    }
    // Reached the endpoint but failed for some other reason, e.g. a 400.
    let search_failure = results
        .iter()
        .filter(|r| r.capability == Capability::SearchRecent)
        .find(|r| r.failure_kind().is_some_and(|kind| !kind.is_skip()));
    if let Some(failure) = search_failure {
        let rationale = match failure.error_code {
            Some(code) => format!("recent search failed ({}); tier could not be determined", code),
            None => "recent search failed; tier could not be determined".to_string(),
        };
        return AccessTierGuess::new(AccessTier::Unknown, rationale);
    }
    let reads_ok = any_with(results, Capability::LookupUser, ProbeResult::is_success)
        || any_with(results, Capability::ListPosts, ProbeResult::is_success);
    if reads_ok {
        return AccessTierGuess::new(
            AccessTier::Unknown,
            "public reads work but recent search was not exercised",
        );
    }

    AccessTierGuess::new(AccessTier::Unknown, "no remote capability succeeded")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(capability: Capability) -> ProbeResult {
        ProbeResult::success("probe", capability, "ok")
    }

    fn failed(capability: Capability, kind: FailureKind, code: u16) -> ProbeResult {
        ProbeResult::failure("probe", capability, kind, None, Some(code))
    }

    #[test]
    fn test_search_and_following_is_elevated() {
        let guess =
            classify_access_tier(&[ok(Capability::SearchRecent), ok(Capability::ListFollowing)]);
        assert_eq!(guess.tier, AccessTier::Elevated);
    }

    #[test]
    fn test_search_only_is_basic() {
        let guess = classify_access_tier(&[
            ok(Capability::LookupUser),
            ok(Capability::SearchRecent),
            failed(Capability::ListFollowing, FailureKind::PermissionRequiresUserContext, 403),
        ]);
        assert_eq!(guess.tier, AccessTier::Basic);
    }

    #[test]
    fn test_rate_limited_search_is_basic() {
        let guess = classify_access_tier(&[failed(
            Capability::SearchRecent,
            FailureKind::RateLimited,
            429,
        )]);
        assert_eq!(guess.tier, AccessTier::Basic);
        assert!(guess.rationale.contains("rate limited"));
    }

    #[test]
    fn test_forbidden_search_is_free() {
        let guess = classify_access_tier(&[
            ok(Capability::LookupUser),
            failed(Capability::SearchRecent, FailureKind::PermissionDenied, 403),
            ok(Capability::ListPosts),
        ]);
        assert_eq!(guess.tier, AccessTier::Free);
    }

    #[test]
    fn test_unauthorized_is_unknown() {
        let guess =
            classify_access_tier(&[failed(Capability::LookupUser, FailureKind::Unauthorized, 401)]);
        assert_eq!(guess.tier, AccessTier::Unknown);
        assert!(guess.rationale.contains("401"));
    }

    #[test]
    fn test_no_evidence_is_unknown() {
        assert_eq!(classify_access_tier(&[]).tier, AccessTier::Unknown);
        let guess = classify_access_tier(&[ok(Capability::LookupUser)]);
        assert_eq!(guess.tier, AccessTier::Unknown);
        assert!(guess.rationale.contains("not exercised"));
    }

    #[test]
    fn test_bad_request_search_is_not_reported_as_unexercised() {
        let guess = classify_access_tier(&[
            ok(Capability::LookupUser),
            failed(Capability::SearchRecent, FailureKind::Unclassified, 400),
        ]);
        assert_eq!(guess.tier, AccessTier::Unknown);
        assert_eq!(guess.rationale, "recent search failed (400); tier could not be determined");
    }

    #[test]
    fn test_skipped_search_is_unexercised() {
        let guess = classify_access_tier(&[
            ok(Capability::LookupUser),
            ProbeResult::missing_credential("search", Capability::SearchRecent),
        ]);
        assert_eq!(guess.tier, AccessTier::Unknown);
        assert!(guess.rationale.contains("not exercised"));
    }
}
