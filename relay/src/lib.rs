//! A relay between a verifier web UI and the Azure AD Verifiable Credentials
//! Request API.
//!
//! The relay exposes three endpoints:
//!
//! * `GET /api/verifier/presentation-request` completes a presentation
//!   request template, sends it to the VC Request API and returns the
//!   upstream response with a correlation `id` for polling.
//! * `POST /api/verifier/presentation-request-callback` receives the VC
//!   Request API's progress callbacks and saves the latest status for the
//!   flow.
//! * `GET /api/verifier/presentation-response?id=` returns that status to the
//!   polling UI.
//!
//! Flow status and the VC Request API access token are kept in a bounded,
//! short-lived in-memory [`Cache`](cache::Cache).

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod payload;
pub mod provider;
pub mod server;
pub mod token;
pub mod types;

mod error;
mod handlers;
mod verifier;

pub use self::client::AzureProvider;
pub use self::config::Config;
pub use self::error::Error;
pub use self::handlers::*;
pub use self::types::*;
pub use self::verifier::Verifier;
