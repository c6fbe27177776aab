//! # Presentation Payload
//!
//! The presentation request sent to the VC Request API is built from a
//! template document. The template supplies everything static (client name,
//! requested credential type, purpose, QR code options) while the relay sets
//! the per-request fields: verifier authority, callback URL, correlation
//! state, callback API key, credential manifest and trusted issuer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;
use crate::handlers::Result;

/// Path of the callback endpoint, relative to the relay's base URL.
pub const CALLBACK_PATH: &str = "/api/verifier/presentation-request-callback";

/// Callback header carrying the relay's API key.
pub const API_KEY_HEADER: &str = "my-api-key";

/// Presentation request accepted by the VC Request API.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresentationRequest {
    /// DID of the verifier.
    #[serde(default)]
    pub authority: String,

    /// Whether the upstream should render a QR code.
    #[serde(rename = "includeQRCode", default, skip_serializing_if = "Option::is_none")]
    pub include_qr_code: Option<bool>,

    /// Verifier display information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<Registration>,

    /// Where and how the upstream reports flow progress.
    pub callback: Callback,

    /// The credentials requested from the wallet.
    pub presentation: Presentation,

    /// Template fields the relay does not touch.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Verifier display information shown in the wallet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Display name of the verifier.
    #[serde(default)]
    pub client_name: String,

    /// Remaining registration fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Callback settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Callback {
    /// Callback URL.
    #[serde(default)]
    pub url: String,

    /// Opaque value echoed back in every callback.
    #[serde(default)]
    pub state: String,

    /// Headers the upstream adds to every callback.
    pub headers: BTreeMap<String, String>,

    /// Remaining callback fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Presentation settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    /// Whether the upstream should include a receipt in the callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_receipt: Option<bool>,

    /// Requested credentials. The relay configures the first.
    pub requested_credentials: Vec<RequestedCredential>,

    /// Remaining presentation fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A credential requested from the wallet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestedCredential {
    /// Credential type.
    #[serde(rename = "type", default)]
    pub type_: String,

    /// Manifest URL of the credential contract.
    #[serde(default)]
    pub manifest: String,

    /// Why the verifier is asking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    /// DIDs of issuers whose credentials are accepted.
    pub trusted_issuers: Vec<String>,

    /// Remaining credential fields.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl PresentationRequest {
    /// Parse and validate a template document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`] if the document is not valid JSON,
    /// lacks `callback.headers` or `presentation.requestedCredentials`, or
    /// the first requested credential has no `trustedIssuers` entry to
    /// replace.
    pub fn from_template(json: &str) -> Result<Self> {
        let request: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidTemplate(e.to_string()))?;
        request.first_credential()?;
        Ok(request)
    }

    fn first_credential(&self) -> Result<&RequestedCredential> {
        let Some(credential) = self.presentation.requested_credentials.first() else {
            return Err(Error::InvalidTemplate("no requested credentials".to_string()));
        };
        if credential.trusted_issuers.is_empty() {
            return Err(Error::InvalidTemplate("no trusted issuers".to_string()));
        }
        Ok(credential)
    }
}

/// Builds a [`PresentationRequest`] from a template.
#[derive(Clone, Debug)]
pub struct PayloadBuilder {
    request: PresentationRequest,
    manifest: Option<String>,
    trusted_issuer: Option<String>,
}

impl PayloadBuilder {
    /// Start from a copy of the template.
    #[must_use]
    pub fn new(template: &PresentationRequest) -> Self {
        Self {
            request: template.clone(),
            manifest: None,
            trusted_issuer: None,
        }
    }

    /// Set the verifier's DID.
    #[must_use]
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.request.authority = authority.into();
        self
    }

    /// Point callbacks at the relay and set the correlation state and API key
    /// they will carry.
    #[must_use]
    pub fn callback(
        mut self, base_url: &str, state: impl Into<String>, api_key: impl Into<String>,
    ) -> Self {
        let callback = &mut self.request.callback;
        callback.url = format!("{}{CALLBACK_PATH}", base_url.trim_end_matches('/'));
        callback.state = state.into();
        callback.headers.insert(API_KEY_HEADER.to_string(), api_key.into());
        self
    }

    /// Set the first requested credential's manifest.
    #[must_use]
    pub fn manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    /// Replace the first requested credential's first trusted issuer.
    #[must_use]
    pub fn trusted_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.trusted_issuer = Some(issuer.into());
        self
    }

    /// Build the presentation request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`] if the template has no requested
    /// credential or trusted issuer to set.
    pub fn build(mut self) -> Result<PresentationRequest> {
        self.request.first_credential()?;
        let credential = &mut self.request.presentation.requested_credentials[0];

        if let Some(manifest) = self.manifest {
            credential.manifest = manifest;
        }
        if let Some(issuer) = self.trusted_issuer {
            credential.trusted_issuers[0] = issuer;
        }
        Ok(self.request)
    }
}

/// The presentation template, read from disk on first use.
///
/// Only a successfully parsed template is kept, so a missing or broken file
/// is retried on the next request.
#[derive(Clone, Debug)]
pub struct Template {
    path: PathBuf,
    cached: Arc<RwLock<Option<Arc<PresentationRequest>>>>,
}

impl Template {
    /// Create a template backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// The template document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] if the file cannot be read or is
    /// empty, and [`Error::InvalidTemplate`] if it cannot be parsed.
    pub async fn load(&self) -> Result<Arc<PresentationRequest>> {
        let cached = self.cached.read().clone();
        if let Some(template) = cached {
            return Ok(template);
        }

        tracing::info!("loading presentation template from {}", self.path.display());
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::TemplateNotFound(format!("{}: {e}", self.path.display())))?;
        if json.trim().is_empty() {
            return Err(Error::TemplateNotFound(format!("{} is empty", self.path.display())));
        }

        let template = Arc::new(PresentationRequest::from_template(&json)?);
        *self.cached.write() = Some(Arc::clone(&template));
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const TEMPLATE: &str = r#"{
        "includeQRCode": true,
        "authority": "did:ion:placeholder",
        "registration": {"clientName": "Verifiable Credential Expert Verifier"},
        "callback": {
            "url": "https://placeholder/api/verifier/presentationCallback",
            "state": "STATEWILLBESETINCODE",
            "headers": {"my-api-key": "placeholder"}
        },
        "presentation": {
            "includeReceipt": true,
            "requestedCredentials": [{
                "type": "VerifiedCredentialExpert",
                "manifest": "https://placeholder/manifest",
                "purpose": "the purpose why the verifier asks for a VC",
                "trustedIssuers": ["did:ion:placeholder-issuer", "did:ion:second"]
            }]
        },
        "customField": {"keep": "me"}
    }"#;

    #[test]
    fn build_sets_dynamic_fields() {
        let template = PresentationRequest::from_template(TEMPLATE).expect("should parse");
        let payload = PayloadBuilder::new(&template)
            .authority("did:ion:verifier")
            .callback("http://localhost:8080/", "corr-1", "secret-key")
            .manifest("https://example.com/manifest")
            .trusted_issuer("did:ion:issuer")
            .build()
            .expect("should build");

        let json = serde_json::to_value(&payload).expect("should serialize");
        assert_eq!(json["authority"], "did:ion:verifier");
        assert_eq!(
            json["callback"]["url"],
            "http://localhost:8080/api/verifier/presentation-request-callback"
        );
        assert_eq!(json["callback"]["state"], "corr-1");
        assert_eq!(json["callback"]["headers"]["my-api-key"], "secret-key");

        let credential = &json["presentation"]["requestedCredentials"][0];
        assert_eq!(credential["manifest"], "https://example.com/manifest");
        assert_eq!(credential["trustedIssuers"], json!(["did:ion:issuer", "did:ion:second"]));

        // untouched template fields survive
        assert_eq!(json["includeQRCode"], true);
        assert_eq!(json["registration"]["clientName"], "Verifiable Credential Expert Verifier");
        assert_eq!(json["presentation"]["includeReceipt"], true);
        assert_eq!(credential["type"], "VerifiedCredentialExpert");
        assert_eq!(json["customField"], json!({"keep": "me"}));

        // the template itself is unchanged
        assert_eq!(template.callback.state, "STATEWILLBESETINCODE");
    }

    #[test]
    fn malformed_template() {
        let err = PresentationRequest::from_template("{ not json").expect_err("should fail");
        assert!(matches!(err, Error::InvalidTemplate(_)));
    }

    #[test]
    fn missing_paths() {
        let no_headers = json!({
            "callback": {"url": ""},
            "presentation": {"requestedCredentials": [{"trustedIssuers": ["x"]}]}
        });
        let no_credentials = json!({
            "callback": {"headers": {}},
            "presentation": {"requestedCredentials": []}
        });
        let no_issuers = json!({
            "callback": {"headers": {}},
            "presentation": {"requestedCredentials": [{"trustedIssuers": []}]}
        });

        for doc in [no_headers, no_credentials, no_issuers] {
            let err = PresentationRequest::from_template(&doc.to_string())
                .expect_err("should reject template");
            assert!(matches!(err, Error::InvalidTemplate(_)), "unexpected error: {err}");
        }
    }

    #[tokio::test]
    async fn missing_file() {
        let template = Template::new("/nonexistent/presentation_request.json");
        let err = template.load().await.expect_err("should fail");
        assert!(matches!(err, Error::TemplateNotFound(_)));
    }

    #[tokio::test]
    async fn loads_once() {
        let path = std::env::temp_dir().join(format!("{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, TEMPLATE).expect("should write template");

        let template = Template::new(&path);
        let first = template.load().await.expect("should load");

        // later loads are served from memory
        std::fs::remove_file(&path).expect("should remove template");
        let second = template.load().await.expect("should load from cache");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
