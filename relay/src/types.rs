//! # Types
//!
//! Request and response bodies for the three relay endpoints, and the flow
//! status correlated between them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status message saved once the wallet has retrieved the request.
pub const RETRIEVED_MESSAGE: &str = "QR Code is scanned. Waiting for validation...";

/// Status message saved once the presentation has been verified.
pub const VERIFIED_MESSAGE: &str = "Presentation received";

/// Request to start a new presentation flow. The endpoint takes no input
/// beyond the caller's base URL.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CreateRequest;

/// The VC Request API's response to a presentation request, with the
/// correlation id added as `id`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct CreateResponse {
    /// Correlation id the UI polls with.
    pub id: String,

    /// Upstream response fields (`requestId`, `url`, `expiry`, `qrCode`, ...),
    /// passed through unchanged.
    #[serde(flatten)]
    pub upstream: Map<String, Value>,
}

impl CreateResponse {
    /// Wrap an upstream response, replacing any `id` it carries.
    #[must_use]
    pub fn new(id: impl Into<String>, mut upstream: Map<String, Value>) -> Self {
        upstream.remove("id");
        Self {
            id: id.into(),
            upstream,
        }
    }
}

/// Callback event codes sent by the VC Request API.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallbackCode {
    /// The wallet has fetched the request (QR code scanned or deep link
    /// followed).
    RequestRetrieved,

    /// The wallet has presented a credential and it has been verified.
    PresentationVerified,

    /// Any other code. Acknowledged but otherwise ignored.
    #[default]
    #[serde(other)]
    Other,
}

/// Callback posted by the VC Request API as a flow progresses.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    /// Upstream request id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Event code.
    #[serde(default)]
    pub code: CallbackCode,

    /// Correlation id set as `callback.state` in the presentation request.
    #[serde(default)]
    pub state: String,

    /// DID of the presenting subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Presented credentials, grouped by issuer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issuers: Vec<IssuerClaims>,

    /// Error details, when the upstream reports a failed flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl CallbackRequest {
    /// A claim from the first issuer's credential, as a string.
    #[must_use]
    pub fn claim(&self, name: &str) -> String {
        self.issuers
            .first()
            .and_then(|issuer| issuer.claims.get(name))
            .map(|value| match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .unwrap_or_default()
    }
}

/// Claims presented from one issuer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct IssuerClaims {
    /// Credential claims.
    #[serde(default)]
    pub claims: Map<String, Value>,

    /// Remaining issuer fields (`type`, `domain`, `verified`, `authority`, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Acknowledgment returned to the VC Request API for every callback.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CallbackResponse {}

/// Flow states that can be saved against a correlation id.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowCode {
    /// The wallet has fetched the request.
    #[default]
    RequestRetrieved,

    /// The presentation has been verified. Terminal.
    PresentationVerified,
}

/// The latest known state of a presentation flow.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowStatus {
    /// Flow state.
    pub status: FlowCode,

    /// Human-readable progress message.
    pub message: String,

    /// DID of the presenting subject.
    pub subject: String,

    /// `firstName` claim of the presented credential.
    pub first_name: String,

    /// `lastName` claim of the presented credential.
    pub last_name: String,

    /// The presented issuers and claims, verbatim.
    pub payload: Value,
}

impl FlowStatus {
    /// Status saved when the wallet retrieves the request.
    #[must_use]
    pub fn retrieved() -> Self {
        Self {
            status: FlowCode::RequestRetrieved,
            message: RETRIEVED_MESSAGE.to_string(),
            ..Self::default()
        }
    }

    /// Status saved when a presentation is verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the presented issuers cannot be re-serialized.
    pub fn verified(callback: &CallbackRequest) -> serde_json::Result<Self> {
        Ok(Self {
            status: FlowCode::PresentationVerified,
            message: VERIFIED_MESSAGE.to_string(),
            subject: callback.subject.clone().unwrap_or_default(),
            first_name: callback.claim("firstName"),
            last_name: callback.claim("lastName"),
            payload: serde_json::to_value(&callback.issuers)?,
        })
    }
}

/// Poll for the status of a presentation flow.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StatusRequest {
    /// Correlation id returned by the presentation request endpoint.
    pub id: String,
}

/// Projection of a [`FlowStatus`] returned to the polling UI. Every field is
/// absent when no status has been saved yet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Flow state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FlowCode>,

    /// Human-readable progress message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// `firstName` claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// `lastName` claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// DID of the presenting subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// The presented issuers and claims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl From<FlowStatus> for StatusResponse {
    fn from(status: FlowStatus) -> Self {
        Self {
            status: Some(status.status),
            message: Some(status.message),
            first_name: Some(status.first_name),
            last_name: Some(status.last_name),
            subject: Some(status.subject),
            payload: (!status.payload.is_null()).then_some(status.payload),
        }
    }
}
