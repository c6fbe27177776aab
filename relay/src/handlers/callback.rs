//! # Presentation Callback Handler
//!
//! The VC Request API calls back as the wallet progresses through a flow:
//! once when the request is retrieved (QR code scanned or deep link
//! followed), and again when the presentation has been verified. Each
//! callback replaces the status saved for its correlation id (`state`),
//! which the UI picks up on its next poll.
//!
//! Every callback is acknowledged with an empty object.

use std::fmt;

use crate::api::{Body, Handler, Headers, Request, Response};
use crate::error::invalid;
use crate::handlers::{Error, Result};
use crate::provider::Provider;
use crate::types::{CallbackCode, CallbackRequest, CallbackResponse, FlowStatus};
use crate::verifier::Verifier;

/// Headers the VC Request API adds to each callback.
#[derive(Clone, Default)]
pub struct CallbackHeaders {
    /// Value of the `my-api-key` header.
    pub api_key: Option<String>,
}

impl fmt::Debug for CallbackHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHeaders")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Headers for CallbackHeaders {}

/// Save the flow status reported by a callback.
///
/// # Errors
///
/// Returns an error if the callback key is required and does not match, or if
/// a recognised callback carries no correlation state.
fn callback<P: Provider>(
    verifier: &Verifier<P>, request: &CallbackRequest, headers: &CallbackHeaders,
) -> Result<CallbackResponse> {
    let config = verifier.config();
    if config.require_callback_key && headers.api_key.as_deref() != Some(config.api_key.as_str())
    {
        return Err(Error::Unauthorized("callback API key missing or incorrect".to_string()));
    }

    let status = match request.code {
        CallbackCode::RequestRetrieved => FlowStatus::retrieved(),
        CallbackCode::PresentationVerified => FlowStatus::verified(request)?,
        CallbackCode::Other => {
            if let Some(error) = &request.error {
                tracing::warn!("presentation flow {} failed: {error}", request.state);
            } else {
                tracing::debug!("ignoring callback for {}", request.state);
            }
            return Ok(CallbackResponse::default());
        }
    };

    if request.state.is_empty() {
        return Err(invalid!("callback {:?} has no state", request.code));
    }
    tracing::info!("presentation flow {} is {:?}", request.state, status.status);
    verifier.cache().put_flow(&request.state, status);

    Ok(CallbackResponse::default())
}

impl<P: Provider> Handler<CallbackResponse, Verifier<P>>
    for Request<CallbackRequest, CallbackHeaders>
{
    type Error = Error;

    async fn handle(self, _: &str, verifier: &Verifier<P>) -> Result<Response<CallbackResponse>> {
        Ok(callback(verifier, &self.body, &self.headers)?.into())
    }
}

impl Body for CallbackRequest {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_redacted() {
        let headers = CallbackHeaders {
            api_key: Some("callback-secret".to_string()),
        };
        let debug = format!("{headers:?}");
        assert!(!debug.contains("callback-secret"));
        assert!(debug.contains("[redacted]"));
    }
}
