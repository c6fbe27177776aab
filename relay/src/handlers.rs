//! # Handlers
//!
//! Requests are routed to the appropriate handler for processing, returning a
//! response that can be serialized to JSON or directly to HTTP.

mod callback;
mod presentation_request;
mod presentation_response;

use tracing::instrument;

pub use self::callback::CallbackHeaders;
pub use crate::api::{Body, Handler, Headers, NoHeaders, Request, Response};
pub use crate::error::Error;
use crate::provider::Provider;
use crate::verifier::Verifier;

/// Result type for the relay.
pub type Result<T, E = Error> = anyhow::Result<T, E>;

/// Handle an incoming relay request.
///
/// # Errors
///
/// Fails when the presentation template cannot be used, an access token
/// cannot be obtained, the VC Request API call fails, or a callback is
/// malformed or unauthorized.
///
/// Implementers should look to the Error type and description for more
/// information on the reason for failure.
// Requests carry the callback key and presented claims, so stay out of spans.
#[instrument(level = "debug", skip(request, verifier))]
pub async fn handle<B, H, P, U>(
    base_url: &str, request: impl Into<Request<B, H>>, verifier: &Verifier<P>,
) -> Result<Response<U>>
where
    B: Body,
    H: Headers,
    P: Provider,
    Request<B, H>: Handler<U, Verifier<P>, Error = Error>,
{
    let request: Request<B, H> = request.into();
    Ok(request.handle(base_url, verifier).await?.into())
}
