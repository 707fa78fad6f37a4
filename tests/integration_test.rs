//! Integration tests for xdiag
//!
//! Drives the real HTTP client against a mock X API and checks the rendered
//! report end to end.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xdiag_client::{XApiClient, XApiConfig};
use xdiag_core::{
    classify_access_tier, render_report, run_diagnostics, write_sample_artifact, AccessTier,
    CredentialField, CredentialSet, FailureKind, ProbePlan, ProbeResult,
};

fn client(server: &MockServer) -> XApiClient {
    XApiClient::new(XApiConfig::default().with_base_url(server.uri())).unwrap()
}

fn bearer_only() -> CredentialSet {
    CredentialSet::new().with(CredentialField::BearerToken, "T")
}

async fn mount_lookup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/userownedai"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "1500",
                "name": "UserOwned.AI",
                "username": "userownedai",
                "public_metrics": { "followers_count": 120, "following_count": 40 }
            }
        })))
        .mount(server)
        .await;
}

fn forbidden(detail: &str) -> ResponseTemplate {
    ResponseTemplate::new(403).set_body_json(json!({
        "title": "Forbidden",
        "detail": detail,
        "type": "about:blank",
        "status": 403
    }))
}

#[tokio::test]
async fn test_free_tier_bearer_only_run() {
    let server = MockServer::start().await;
    mount_lookup(&server).await;

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(forbidden("Your current access level does not include this endpoint."))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/users/1500/following"))
        .respond_with(forbidden("Forbidden"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/users/1500/tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "9", "text": "gm",
                  "public_metrics": { "like_count": 10, "retweet_count": 2 } }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/users/me"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let probes = ProbePlan::new()
        .resolve_user("userownedai")
        .authenticated_identity()
        .list_followed_accounts("userownedai", 5)
        .search_recent("AI crypto blockchain", 10)
        .list_recent_posts("userownedai", 5, true, true)
        .into_probes();

    let report = run_diagnostics(&client(&server), &bearer_only(), &probes).await;

    let kinds: Vec<_> = report.results().iter().map(ProbeResult::failure_kind).collect();
    assert_eq!(
        kinds,
        vec![
            None,
            Some(FailureKind::MissingCredential),
            Some(FailureKind::PermissionRequiresUserContext),
            Some(FailureKind::PermissionDenied),
            None,
        ]
    );
    assert_eq!(classify_access_tier(report.results()).tier, AccessTier::Free);

    let text = render_report(&report);
    assert!(text.contains(
        "[PASS] resolve_user(@userownedai): UserOwned.AI (@userownedai) id=1500 followers=120"
    ));
    assert!(text.contains("Result: 2/5 probes succeeded (2 failed, 1 skipped)"));
    assert!(text.contains("Access tier guess: free"));
    assert_eq!(text.matches("[403]").count(), 1);
    assert_eq!(report.exit_code(), 1);

    assert_eq!(report.samples().len(), 1);
    assert_eq!(report.samples()[0].author, "userownedai");
    assert_eq!(report.samples()[0].engagement, 12);
}

#[tokio::test]
async fn test_elevated_run_writes_artifact() {
    let server = MockServer::start().await;
    mount_lookup(&server).await;

    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "1", "text": "first", "author_id": "7",
                  "public_metrics": { "like_count": 1, "retweet_count": 1 } },
                { "id": "2", "text": "second", "author_id": "7" }
            ],
            "includes": { "users": [{ "id": "7", "name": "Seven", "username": "seven" }] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/users/1500/following"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "7", "name": "Seven", "username": "seven" }]
        })))
        .mount(&server)
        .await;

    let probes = ProbePlan::new()
        .list_followed_accounts("userownedai", 5)
        .search_recent("ai", 10)
        .into_probes();

    let report = run_diagnostics(&client(&server), &bearer_only(), &probes).await;

    assert!(report.results().iter().all(ProbeResult::is_success));
    assert_eq!(classify_access_tier(report.results()).tier, AccessTier::Elevated);
    assert_eq!(report.exit_code(), 0);

    let tmp = tempfile::tempdir().unwrap();
    let written = write_sample_artifact(tmp.path(), &report, "Daily Brief", chrono::Utc::now())
        .unwrap()
        .unwrap();
    let artifact: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();

    assert_eq!(artifact["title"], "Daily Brief");
    assert_eq!(artifact["sources"], 2);
    assert_eq!(artifact["top_posts"][0]["author"], "seven");
    assert_eq!(artifact["top_posts"][0]["engagement"], 2);
}

#[tokio::test]
async fn test_rejected_user_context_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "Unauthorized",
            "type": "about:blank",
            "status": 401,
            "detail": "Unauthorized"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = CredentialSet::new()
        .with(CredentialField::ApiKey, "key")
        .with(CredentialField::ApiSecret, "secret")
        .with(CredentialField::AccessToken, "access")
        .with(CredentialField::AccessTokenSecret, "access-secret");
    let probes = ProbePlan::new().authenticated_identity().into_probes();

    let report = run_diagnostics(&client(&server), &credentials, &probes).await;

    assert_eq!(
        report.results()[0].failure_kind(),
        Some(FailureKind::Unauthorized)
    );
    let text = render_report(&report);
    assert!(text.contains("[401] Credentials rejected"));
    assert!(text.contains("Access tier guess: unknown"));
}
