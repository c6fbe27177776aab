//! # Presentation Response Handler
//!
//! Polled by the UI for progress of a presentation flow. Returns the latest
//! status saved for the correlation id, or an empty response while no
//! callback has arrived (or the status has expired) so the UI keeps polling.

use crate::api::{Body, Handler, Request, Response};
use crate::handlers::{Error, Result};
use crate::provider::Provider;
use crate::types::{StatusRequest, StatusResponse};
use crate::verifier::Verifier;

fn presentation_response<P: Provider>(
    verifier: &Verifier<P>, request: &StatusRequest,
) -> StatusResponse {
    verifier.cache().flow(&request.id).map(StatusResponse::from).unwrap_or_default()
}

impl<P: Provider> Handler<StatusResponse, Verifier<P>> for Request<StatusRequest> {
    type Error = Error;

    async fn handle(self, _: &str, verifier: &Verifier<P>) -> Result<Response<StatusResponse>> {
        Ok(presentation_response(verifier, &self.body).into())
    }
}

impl Body for StatusRequest {}
