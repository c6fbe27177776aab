//! # HTTP Server
//!
//! Axum routes for the three relay endpoints. Failures are logged in full and
//! returned to the caller as a terse plain-text body.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::TypedHeader;
use axum_extra::headers::Host;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{NoHeaders, Request, Response};
use crate::error::invalid;
use crate::handlers::CallbackHeaders;
use crate::payload::{API_KEY_HEADER, CALLBACK_PATH};
use crate::provider::Provider;
use crate::types::{
    CallbackRequest, CallbackResponse, CreateRequest, CreateResponse, StatusRequest,
    StatusResponse,
};
use crate::verifier::Verifier;

/// Path of the endpoint the UI calls to start a flow.
pub const REQUEST_PATH: &str = "/api/verifier/presentation-request";

/// Path of the endpoint the UI polls for flow status.
pub const RESPONSE_PATH: &str = "/api/verifier/presentation-response";

/// Build the relay's router.
pub fn router<P: Provider + 'static>(verifier: Verifier<P>) -> Router {
    Router::new()
        .route(REQUEST_PATH, get(presentation_request::<P>))
        .route(CALLBACK_PATH, post(callback::<P>))
        .route(RESPONSE_PATH, get(presentation_response::<P>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any))
        .with_state(verifier)
}

/// Bind `addr` and serve the relay in a background task.
///
/// Returns the bound address, which differs from `addr` when binding to
/// port 0.
///
/// # Errors
///
/// Returns an error if `addr` cannot be bound.
pub async fn serve<P: Provider + 'static>(
    addr: &str, verifier: Verifier<P>,
) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    let local_addr = listener.local_addr().context("reading local address")?;
    let router = router(verifier);

    let jh = tokio::spawn(async move {
        tracing::info!("listening on {local_addr}");
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("server stopped: {e}");
        }
    });

    Ok((local_addr, jh))
}

async fn presentation_request<P: Provider>(
    State(verifier): State<Verifier<P>>, TypedHeader(host): TypedHeader<Host>,
) -> HttpResult<CreateResponse> {
    let base_url = verifier.config().base_url(&host.to_string());
    let request = Request {
        body: CreateRequest,
        headers: NoHeaders,
    };
    HttpResult(verifier.handle::<CreateRequest, NoHeaders, _>(&base_url, request).await)
}

// Callbacks and polls never build URLs, so neither depends on `Host`.
async fn callback<P: Provider>(
    State(verifier): State<Verifier<P>>, headers: HeaderMap, body: Bytes,
) -> HttpResult<CallbackResponse> {
    let body = match serde_json::from_slice::<CallbackRequest>(&body) {
        Ok(body) => body,
        Err(e) => return HttpResult(Err(invalid!("malformed callback: {}", e))),
    };
    let api_key =
        headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).map(ToString::to_string);
    let request = Request {
        body,
        headers: CallbackHeaders { api_key },
    };

    let response = verifier.handle::<CallbackRequest, CallbackHeaders, _>("", request).await;
    HttpResult(response)
}

async fn presentation_response<P: Provider>(
    State(verifier): State<Verifier<P>>, query: Result<Query<StatusRequest>, QueryRejection>,
) -> HttpResult<StatusResponse> {
    let Ok(Query(body)) = query else {
        return HttpResult(Err(invalid!("presentation response requires an `id`")));
    };
    let request = Request {
        body,
        headers: NoHeaders,
    };
    HttpResult(verifier.handle::<StatusRequest, NoHeaders, _>("", request).await)
}

async fn health() -> &'static str {
    "ok"
}

// ----------------------------------------------------------------------------
// Axum Response
// ----------------------------------------------------------------------------

/// Axum response wrapper
struct HttpResult<T>(crate::handlers::Result<Response<T>>);

impl<T> IntoResponse for HttpResult<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        match self.0 {
            Ok(response) => (response.status, Json(response.body)).into_response(),
            Err(e) => {
                tracing::error!("{e}");
                (e.status(), e.message()).into_response()
            }
        }
    }
}
