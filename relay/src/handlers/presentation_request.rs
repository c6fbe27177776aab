//! # Presentation Request Handler
//!
//! Called by the UI to start a presentation flow. The presentation template
//! is completed with this request's callback URL and a fresh correlation id,
//! then POSTed to the VC Request API. The upstream response (request URL,
//! QR code, expiry) is returned to the UI with the correlation id added as
//! `id` so the UI can poll for progress.
//!
//! No flow status is saved here: the first status appears when the upstream
//! calls back.

use serde_json::Value;
use uuid::Uuid;

use crate::api::{Body, Handler, Request, Response};
use crate::error::stack;
use crate::handlers::{Error, Result};
use crate::payload::PayloadBuilder;
use crate::provider::{PresentationApi, Provider};
use crate::token;
use crate::types::{CreateRequest, CreateResponse};
use crate::verifier::Verifier;

/// Create a presentation request.
///
/// # Errors
///
/// Returns an error if the template cannot be loaded or completed, a token
/// cannot be obtained, or the upstream call fails.
async fn presentation_request<P: Provider>(
    base_url: &str, verifier: &Verifier<P>, _: CreateRequest,
) -> Result<CreateResponse> {
    let template = verifier.template().load().await?;
    let config = verifier.config();

    let correlation_id = Uuid::new_v4().to_string();
    let payload = PayloadBuilder::new(&template)
        .authority(&config.verifier_authority)
        .callback(base_url, &correlation_id, &config.api_key)
        .manifest(&config.credential_manifest)
        .trusted_issuer(&config.issuer_authority)
        .build()?;

    let token = token::access_token(verifier.cache(), verifier.provider()).await?;
    let response = PresentationApi::create_presentation(verifier.provider(), &token, &payload)
        .await
        .map_err(|e| Error::Upstream(stack(&e)))?;

    let upstream = match response {
        Value::Object(upstream) => upstream,
        other => return Err(Error::Upstream(format!("expected a JSON object, got {other}"))),
    };
    tracing::info!("presentation request {correlation_id} created");

    Ok(CreateResponse::new(correlation_id, upstream))
}

impl<P: Provider> Handler<CreateResponse, Verifier<P>> for Request<CreateRequest> {
    type Error = Error;

    async fn handle(
        self, base_url: &str, verifier: &Verifier<P>,
    ) -> Result<Response<CreateResponse>> {
        Ok(presentation_request(base_url, verifier, self.body).await?.into())
    }
}

impl Body for CreateRequest {}
