//! # Azure Provider
//!
//! [`Provider`](crate::provider::Provider) implementation backed by Azure AD:
//! tokens come from the tenant's OAuth 2.0 token endpoint using the client
//! credential grant, and presentation requests are POSTed to the VC Request
//! API.

use anyhow::{Context, Result, anyhow, bail};
use oauth2::basic::BasicClient;
use oauth2::{AuthType, ClientId, ClientSecret, Scope, TokenResponse, TokenUrl};
use serde_json::Value;

use crate::config::Config;
use crate::payload::PresentationRequest;
use crate::provider::{Authorizer, PresentationApi};

/// Azure AD backed provider.
#[derive(Clone)]
pub struct AzureProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    endpoint: String,
}

impl AzureProvider {
    /// Create a provider from relay configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        // the token endpoint must not be followed through redirects
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.upstream_timeout)
            .build()
            .context("building http client")?;

        Ok(Self {
            http,
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            endpoint: config.endpoint(),
        })
    }
}

impl Authorizer for AzureProvider {
    async fn acquire_token(&self) -> Result<String> {
        tracing::info!("acquiring access token via client credentials");

        let token_url = TokenUrl::new(self.token_url.clone())
            .map_err(|e| anyhow!("invalid authority '{}': {e}", self.token_url))?;
        let client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(token_url);

        let response = client
            .exchange_client_credentials()
            .add_scope(Scope::new(self.scope.clone()))
            .request_async(&self.http)
            .await
            .map_err(|e| anyhow!("client credential exchange failed: {e}"))?;

        Ok(response.access_token().secret().clone())
    }
}

impl PresentationApi for AzureProvider {
    async fn create_presentation(
        &self, token: &str, request: &PresentationRequest,
    ) -> Result<Value> {
        tracing::debug!("calling VC Request API at {}", self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .context("sending presentation request")?;

        let status = response.status();
        let body = response.text().await.context("reading presentation response")?;
        if !status.is_success() {
            bail!("VC Request API returned {status}: {body}");
        }
        tracing::debug!("VC Request API response: {body}");

        serde_json::from_str(&body).context("parsing presentation response")
    }
}
