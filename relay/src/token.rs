//! # Access Token
//!
//! Bearer tokens for the VC Request API are cached under a single key in the
//! session cache and reused until that entry expires or is evicted. The
//! token's own OAuth lifetime is not consulted.

use crate::Error;
use crate::cache::Cache;
use crate::error::stack;
use crate::handlers::Result;
use crate::provider::Authorizer;

/// Return the cached access token, acquiring and caching a new one on a miss.
///
/// # Errors
///
/// Returns [`Error::TokenAcquisition`] if the credential exchange fails.
/// Nothing is cached in that case.
pub async fn access_token(cache: &Cache, authorizer: &impl Authorizer) -> Result<String> {
    if let Some(token) = cache.token() {
        return Ok(token);
    }

    let token =
        authorizer.acquire_token().await.map_err(|e| Error::TokenAcquisition(stack(&e)))?;
    if token.is_empty() {
        return Err(Error::TokenAcquisition("empty access token".to_string()));
    }

    cache.put_token(token.clone());
    Ok(token)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;

    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Authorizer for Counting {
        async fn acquire_token(&self) -> anyhow::Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("AADSTS7000215: invalid client secret"));
            }
            Ok(format!("token-{n}"))
        }
    }

    #[tokio::test]
    async fn reuses_cached_token() {
        let cache = Cache::new();
        let authorizer = Counting::default();

        for _ in 0..5 {
            let token = access_token(&cache, &authorizer).await.expect("should get token");
            assert_eq!(token, "token-0");
        }
        assert_eq!(authorizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let cache = Cache::new();
        let authorizer = Counting {
            fail: true,
            ..Counting::default()
        };

        let err = access_token(&cache, &authorizer).await.expect_err("should fail");
        assert!(matches!(err, Error::TokenAcquisition(_)));
        assert!(cache.token().is_none());

        // the next call tries again
        access_token(&cache, &authorizer).await.expect_err("should fail");
        assert_eq!(authorizer.calls.load(Ordering::SeqCst), 2);
    }
}
