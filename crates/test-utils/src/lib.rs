//! # Mock Provider

pub mod verifier;

pub use verifier::MockProvider;
