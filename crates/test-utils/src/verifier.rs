use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use serde_json::{Value, json};
use verifier_relay::config::{DEFAULT_AUTHORITY, DEFAULT_SCOPE, DEFAULT_UPSTREAM_TIMEOUT};
use verifier_relay::payload::PresentationRequest;
use verifier_relay::Config;
use verifier_relay::provider::{Authorizer, PresentationApi};

pub const API_KEY: &str = "c7a3b0e5-callback-key";
pub const ISSUER_AUTHORITY: &str = "did:ion:EiBWe9RtHT7VZ-Juff8OnnJAyFJtCokcYHx1CQkFtpl7pw";
pub const VERIFIER_AUTHORITY: &str = "did:ion:EiCHWdcabzGkvLkFP6wGUsuDIaWkHeh1NUqPRLXzDXt3Lw";
pub const MANIFEST: &str = "https://beta.did.msidentity.com/v1.0/9c59be8b-bd18-45d9-b9d0-082bc07c094f/verifiableCredential/contracts/VerifiedCredentialExpert";

const REQUEST_URI: &str =
    "https://beta.did.msidentity.com/v1.0/tenant/verifiablecredentials/request";

/// Path to the presentation request template fixture.
#[must_use]
pub fn template_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/presentation_request.json")
}

/// Relay configuration pointing at the template fixture.
#[must_use]
pub fn config() -> Config {
    Config {
        presentation_file: template_path(),
        api_endpoint: "https://beta.did.msidentity.com/v1.0/{0}/verifiablecredentials/request"
            .to_string(),
        tenant_id: "9c59be8b-bd18-45d9-b9d0-082bc07c094f".to_string(),
        api_key: API_KEY.to_string(),
        scope: DEFAULT_SCOPE.to_string(),
        client_id: "d2d6ff7b-client".to_string(),
        client_secret: "client-secret".to_string(),
        authority: DEFAULT_AUTHORITY.to_string(),
        issuer_authority: ISSUER_AUTHORITY.to_string(),
        verifier_authority: VERIFIER_AUTHORITY.to_string(),
        credential_manifest: MANIFEST.to_string(),
        public_url: None,
        require_callback_key: false,
        upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
    }
}

/// How the mock VC Request API answers.
#[derive(Clone, Debug, Default)]
pub enum Upstream {
    /// A presentation request response with a fresh `requestId`.
    #[default]
    Created,

    /// The given body.
    Body(Value),

    /// A failed call.
    Fail,
}

#[derive(Default)]
struct Inner {
    fail_token: bool,
    upstream: Upstream,
    token_calls: AtomicUsize,
    requests: Mutex<Vec<(String, PresentationRequest)>>,
}

/// Provider that records its calls instead of reaching Azure AD.
#[derive(Clone, Default)]
pub struct MockProvider {
    inner: Arc<Inner>,
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose credential exchange always fails.
    #[must_use]
    pub fn failing_token() -> Self {
        Self {
            inner: Arc::new(Inner {
                fail_token: true,
                ..Inner::default()
            }),
        }
    }

    /// A provider whose VC Request API answers as `upstream`.
    #[must_use]
    pub fn with_upstream(upstream: Upstream) -> Self {
        Self {
            inner: Arc::new(Inner {
                upstream,
                ..Inner::default()
            }),
        }
    }

    /// Number of credential exchanges performed.
    #[must_use]
    pub fn token_calls(&self) -> usize {
        self.inner.token_calls.load(Ordering::SeqCst)
    }

    /// Presentation requests sent upstream, with the bearer token used.
    #[must_use]
    pub fn requests(&self) -> Vec<(String, PresentationRequest)> {
        self.inner.requests.lock().clone()
    }
}

impl Authorizer for MockProvider {
    async fn acquire_token(&self) -> Result<String> {
        let n = self.inner.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_token {
            return Err(anyhow!("AADSTS7000215: Invalid client secret provided"));
        }
        Ok(format!("eyJ0eXAiOiJKV1Qi.mock-{n}"))
    }
}

impl PresentationApi for MockProvider {
    async fn create_presentation(
        &self, token: &str, request: &PresentationRequest,
    ) -> Result<Value> {
        self.inner.requests.lock().push((token.to_string(), request.clone()));

        match &self.inner.upstream {
            Upstream::Created => {
                let request_id = uuid::Uuid::new_v4().to_string();
                Ok(json!({
                    "requestId": request_id,
                    "url": format!("openid-vc://?request_uri={REQUEST_URI}/{request_id}"),
                    "expiry": 1_633_017_751
                }))
            }
            Upstream::Body(body) => Ok(body.clone()),
            Upstream::Fail => Err(anyhow!("VC Request API returned 401 Unauthorized")),
        }
    }
}
