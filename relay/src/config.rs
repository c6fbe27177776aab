//! Configuration for the relay.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder substituted with the tenant id in endpoint and authority
/// templates.
const TENANT_PLACEHOLDER: &str = "{0}";

/// Default OAuth scope for the Verifiable Credentials Request Service.
pub const DEFAULT_SCOPE: &str = "3db474b9-6a0c-4840-96ac-1fceb342124f/.default";

/// Default identity authority template.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/{0}";

/// Default upstream request timeout.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Relay configuration.
#[derive(Clone)]
pub struct Config {
    /// Path to the presentation request template.
    pub presentation_file: PathBuf,

    /// VC Request API endpoint. `{0}` is replaced with the tenant id.
    pub api_endpoint: String,

    /// Azure AD tenant id.
    pub tenant_id: String,

    /// API key the upstream echoes in the `my-api-key` callback header.
    pub api_key: String,

    /// OAuth scope requested in the client-credential grant.
    pub scope: String,

    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Identity authority. `{0}` is replaced with the tenant id.
    pub authority: String,

    /// DID of the only issuer trusted for the requested credential.
    pub issuer_authority: String,

    /// DID of this verifier.
    pub verifier_authority: String,

    /// URL of the requested credential's manifest.
    pub credential_manifest: String,

    /// Base URL used for callbacks instead of the request's `Host` header.
    pub public_url: Option<String>,

    /// Reject callbacks that do not echo the configured API key.
    pub require_callback_key: bool,

    /// Timeout for outbound calls.
    pub upstream_timeout: Duration,
}

impl Config {
    /// The VC Request API endpoint for the configured tenant.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.api_endpoint.replace(TENANT_PLACEHOLDER, &self.tenant_id)
    }

    /// The OAuth 2.0 token endpoint for the configured tenant.
    #[must_use]
    pub fn token_url(&self) -> String {
        let authority = self.authority.replace(TENANT_PLACEHOLDER, &self.tenant_id);
        format!("{}/oauth2/v2.0/token", authority.trim_end_matches('/'))
    }

    /// Base URL for callbacks: the configured public URL when set, otherwise
    /// derived from the request's host.
    #[must_use]
    pub fn base_url(&self, host: &str) -> String {
        self.public_url.as_ref().map_or_else(
            || format!("http://{host}"),
            |url| url.trim_end_matches('/').to_string(),
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("presentation_file", &self.presentation_file)
            .field("api_endpoint", &self.api_endpoint)
            .field("tenant_id", &self.tenant_id)
            .field("api_key", &"[redacted]")
            .field("scope", &self.scope)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("authority", &self.authority)
            .field("issuer_authority", &self.issuer_authority)
            .field("verifier_authority", &self.verifier_authority)
            .field("credential_manifest", &self.credential_manifest)
            .field("public_url", &self.public_url)
            .field("require_callback_key", &self.require_callback_key)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}
