//! Verifier relay
//!
//! Serves the presentation request, callback and status endpoints until
//! `ctrl-c`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use verifier_relay::config::{DEFAULT_AUTHORITY, DEFAULT_SCOPE};
use verifier_relay::{AzureProvider, Config, Verifier, server};

/// Relay between a verifier web UI and the Azure AD Verifiable Credentials
/// Request API.
#[derive(Parser, Debug)]
#[command(name = "verifier-relay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the presentation request template.
    #[arg(long, env = "aadvc_PresentationFile")]
    presentation_file: PathBuf,

    /// VC Request API endpoint; `{0}` is replaced with the tenant id.
    #[arg(long, env = "aadvc_ApiEndpoint")]
    api_endpoint: String,

    /// Azure AD tenant id.
    #[arg(long, env = "aadvc_TenantId")]
    tenant_id: String,

    /// API key the VC Request API echoes on callbacks.
    #[arg(long, env = "aadvc_ApiKey", hide_env_values = true)]
    api_key: String,

    /// OAuth scope for the VC Request API.
    #[arg(long, env = "aadvc_scope", default_value = DEFAULT_SCOPE)]
    scope: String,

    /// OAuth client id.
    #[arg(long, env = "aadvc_ClientId")]
    client_id: String,

    /// OAuth client secret.
    #[arg(long, env = "aadvc_ClientSecret", hide_env_values = true)]
    client_secret: String,

    /// Identity authority; `{0}` is replaced with the tenant id.
    #[arg(long, env = "aadvc_Authority", default_value = DEFAULT_AUTHORITY)]
    authority: String,

    /// DID of the trusted credential issuer.
    #[arg(long, env = "aadvc_IssuerAuthority")]
    issuer_authority: String,

    /// DID of this verifier.
    #[arg(long, env = "aadvc_VerifierAuthority")]
    verifier_authority: String,

    /// Manifest URL of the requested credential.
    #[arg(long, env = "aadvc_CredentialManifest")]
    credential_manifest: String,

    /// Address to listen on.
    #[arg(long, env = "RELAY_LISTEN", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Public base URL for callbacks, e.g. an ngrok tunnel.
    #[arg(long, env = "RELAY_PUBLIC_URL")]
    public_url: Option<String>,

    /// Reject callbacks without the configured API key.
    #[arg(long, env = "RELAY_REQUIRE_CALLBACK_KEY")]
    require_callback_key: bool,

    /// Timeout for outbound calls, in seconds.
    #[arg(long, env = "RELAY_UPSTREAM_TIMEOUT", default_value = "30")]
    upstream_timeout: u64,

    /// Log level, used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            presentation_file: self.presentation_file,
            api_endpoint: self.api_endpoint,
            tenant_id: self.tenant_id,
            api_key: self.api_key,
            scope: self.scope,
            client_id: self.client_id,
            client_secret: self.client_secret,
            authority: self.authority,
            issuer_authority: self.issuer_authority,
            verifier_authority: self.verifier_authority,
            credential_manifest: self.credential_manifest,
            public_url: self.public_url,
            require_callback_key: self.require_callback_key,
            upstream_timeout: Duration::from_secs(self.upstream_timeout),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!("verifier-relay v{}", env!("CARGO_PKG_VERSION"));

    let listen = cli.listen.clone();
    let config = cli.into_config();
    tracing::debug!("{config:?}");

    let provider = AzureProvider::new(&config)?;
    let verifier = Verifier::new(config, provider);
    server::serve(&listen, verifier).await?;

    // block until `ctrl-c`
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    Ok(())
}
