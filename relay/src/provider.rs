//! # Provider
//!
//! Outbound collaborators of the relay. Implementers supply the
//! client-credential exchange and the authenticated call to the VC Request
//! API; caching and correlation stay in the relay.

use std::future::Future;

use anyhow::Result;
use serde_json::Value;

use crate::payload::PresentationRequest;

/// Relay Provider trait.
pub trait Provider: Authorizer + PresentationApi + Clone {}

/// A type that implements all the provider traits is a [`Provider`].
impl<T> Provider for T where T: Authorizer + PresentationApi + Clone {}

/// The `Authorizer` trait obtains bearer tokens for the VC Request API.
pub trait Authorizer: Send + Sync {
    /// Perform one client-credential grant exchange and return the access
    /// token. Implementations should not cache.
    fn acquire_token(&self) -> impl Future<Output = Result<String>> + Send;
}

/// The `PresentationApi` trait calls the VC Request API.
pub trait PresentationApi: Send + Sync {
    /// POST a presentation request, authenticated with `token`, and return the
    /// parsed response body.
    ///
    /// Transport failures and non-success statuses are errors.
    fn create_presentation(
        &self, token: &str, request: &PresentationRequest,
    ) -> impl Future<Output = Result<Value>> + Send;
}
