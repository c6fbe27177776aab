//! # Verifier
//!
//! [`Verifier`] owns everything the handlers share: configuration, the
//! session cache, the presentation template and the outbound provider. It is
//! constructed once per process and cloned into each request.

use std::sync::Arc;

use crate::api::{Body, Handler, Headers, Request, Response};
use crate::cache::Cache;
use crate::config::Config;
use crate::handlers::{Error, Result};
use crate::payload::Template;
use crate::provider::Provider;

/// Verifier relay state.
#[derive(Clone)]
pub struct Verifier<P: Provider> {
    config: Arc<Config>,
    cache: Cache,
    template: Template,
    provider: P,
}

impl<P: Provider> Verifier<P> {
    /// Create a verifier with a fresh session cache.
    #[must_use]
    pub fn new(config: Config, provider: P) -> Self {
        Self {
            template: Template::new(&config.presentation_file),
            config: Arc::new(config),
            cache: Cache::new(),
            provider,
        }
    }

    /// Use `cache` as the session cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = cache;
        self
    }

    /// Relay configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Session cache.
    #[must_use]
    pub const fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Outbound provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub(crate) const fn template(&self) -> &Template {
        &self.template
    }

    /// Handle a request on behalf of a caller that reached the relay at
    /// `base_url`.
    ///
    /// # Errors
    ///
    /// Returns the handler's error. See [`Error`] for the taxonomy.
    pub async fn handle<B, H, U>(
        &self, base_url: &str, request: impl Into<Request<B, H>>,
    ) -> Result<Response<U>>
    where
        B: Body,
        H: Headers,
        Request<B, H>: Handler<U, Self, Error = Error>,
    {
        crate::handle(base_url, request, self).await
    }
}
