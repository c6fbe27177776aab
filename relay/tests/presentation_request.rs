//! Tests for the presentation request endpoint

use std::collections::HashSet;

use reqwest::StatusCode;
use serde_json::{Value, json};
use test_utils::MockProvider;
use test_utils::verifier::{
    API_KEY, ISSUER_AUTHORITY, MANIFEST, Upstream, VERIFIER_AUTHORITY, config,
};
use verifier_relay::{Config, Verifier, server};

// Serve the relay on an ephemeral port, returning its base URL.
async fn relay(config: Config, provider: MockProvider) -> String {
    let verifier = Verifier::new(config, provider);
    let (addr, _) = server::serve("127.0.0.1:0", verifier).await.expect("should serve");
    format!("http://{addr}")
}

async fn presentation_request(base: &str) -> reqwest::Response {
    reqwest::get(format!("{base}/api/verifier/presentation-request"))
        .await
        .expect("should get response")
}

#[tokio::test]
async fn creates_request() {
    let provider = MockProvider::new();
    let base = relay(config(), provider.clone()).await;

    let response = presentation_request(&base).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");

    let body: Value = response.json().await.expect("should be json");
    let id = body["id"].as_str().expect("should have id");
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert!(body["requestId"].is_string());
    assert!(body["url"].as_str().is_some_and(|url| url.starts_with("openid-vc://")));
    assert_eq!(body["expiry"], 1_633_017_751);

    // --------------------------------------------------
    // The payload sent upstream carries the dynamic fields
    // --------------------------------------------------
    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let (token, payload) = &requests[0];
    assert!(token.starts_with("eyJ0eXAi"));

    assert_eq!(payload.authority, VERIFIER_AUTHORITY);
    assert_eq!(
        payload.callback.url,
        format!("{base}/api/verifier/presentation-request-callback")
    );
    assert_eq!(payload.callback.state, id);
    assert_eq!(payload.callback.headers["my-api-key"], API_KEY);

    let credential = &payload.presentation.requested_credentials[0];
    assert_eq!(credential.manifest, MANIFEST);
    assert_eq!(credential.trusted_issuers, vec![ISSUER_AUTHORITY.to_string()]);
    assert_eq!(credential.type_, "VerifiedCredentialExpert");
}

#[tokio::test]
async fn public_url_overrides_host() {
    let provider = MockProvider::new();
    let config = Config {
        public_url: Some("https://8f2c-203-0-113-7.ngrok.io/".to_string()),
        ..config()
    };
    let base = relay(config, provider.clone()).await;

    let response = presentation_request(&base).await;
    assert_eq!(response.status(), StatusCode::OK);

    let requests = provider.requests();
    let (_, payload) = &requests[0];
    assert_eq!(
        payload.callback.url,
        "https://8f2c-203-0-113-7.ngrok.io/api/verifier/presentation-request-callback"
    );
}

#[tokio::test]
async fn ids_are_unique() {
    let base = relay(config(), MockProvider::new()).await;

    let mut ids = HashSet::new();
    for _ in 0..10 {
        let body: Value =
            presentation_request(&base).await.json().await.expect("should be json");
        let id = body["id"].as_str().expect("should have id").to_string();
        assert!(ids.insert(id), "correlation id reused");
    }
}

// A cached token is reused, so only one credential exchange happens.
#[tokio::test]
async fn token_is_reused() {
    let provider = MockProvider::new();
    let base = relay(config(), provider.clone()).await;

    for _ in 0..5 {
        let response = presentation_request(&base).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(provider.token_calls(), 1);
    let requests = provider.requests();
    assert_eq!(requests.len(), 5);
    assert!(requests.iter().all(|(token, _)| *token == requests[0].0));
}

#[tokio::test]
async fn template_missing() {
    let provider = MockProvider::new();
    let config = Config {
        presentation_file: "/nonexistent/presentation_request.json".into(),
        ..config()
    };
    let base = relay(config, provider.clone()).await;

    let response = presentation_request(&base).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await.expect("should have body"),
        "Presentation request file not found"
    );

    // nothing went upstream
    assert_eq!(provider.token_calls(), 0);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn template_incomplete() {
    let path = std::env::temp_dir().join(format!("{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, r#"{"authority": "did:web:verifier.example.com"}"#)
        .expect("should write template");

    let provider = MockProvider::new();
    let config = Config {
        presentation_file: path.clone(),
        ..config()
    };
    let base = relay(config, provider.clone()).await;

    let response = presentation_request(&base).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.expect("should have body"), "Technical error");
    assert_eq!(provider.token_calls(), 0);
    assert!(provider.requests().is_empty());

    std::fs::remove_file(path).expect("should remove template");
}

#[tokio::test]
async fn token_failure() {
    let provider = MockProvider::failing_token();
    let base = relay(config(), provider.clone()).await;

    let response = presentation_request(&base).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.expect("should have body"), "Technical error");
    assert!(provider.requests().is_empty());

    // failures are not cached
    presentation_request(&base).await;
    assert_eq!(provider.token_calls(), 2);
}

#[tokio::test]
async fn upstream_failure() {
    let provider = MockProvider::with_upstream(Upstream::Fail);
    let base = relay(config(), provider.clone()).await;

    let response = presentation_request(&base).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.expect("should have body"), "Technical error");
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn upstream_not_an_object() {
    let provider = MockProvider::with_upstream(Upstream::Body(json!(["unexpected"])));
    let base = relay(config(), provider).await;

    let response = presentation_request(&base).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.expect("should have body"), "Technical error");
}

#[tokio::test]
async fn health() {
    let base = relay(config(), MockProvider::new()).await;
    let response = reqwest::get(format!("{base}/health")).await.expect("should get response");
    assert_eq!(response.status(), StatusCode::OK);
}
