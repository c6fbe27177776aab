//! # Relay Errors
//!
//! Errors raised while relaying a presentation request, its callbacks, or a
//! status poll. The `Display` form carries full detail for the server log;
//! callers only ever see the terse message returned by [`Error::message`].

use http::StatusCode;
use thiserror::Error;

/// Client-visible body for any failure the caller cannot act on.
pub const TECHNICAL_ERROR: &str = "Technical error";

/// Client-visible body when the presentation template cannot be read.
pub const TEMPLATE_NOT_FOUND: &str = "Presentation request file not found";

/// Errors returned by relay handlers.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The presentation template file is missing or unreadable.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// The presentation template is not valid JSON or lacks a required path.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// The inbound request is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A callback did not carry the expected API key.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The client-credential exchange failed.
    #[error("token acquisition failed: {0}")]
    TokenAcquisition(String),

    /// The VC Request API call failed or returned an unusable response.
    #[error("upstream call failed: {0}")]
    Upstream(String),

    /// Anything else.
    #[error("server error: {0}")]
    ServerError(String),
}

impl Error {
    /// The HTTP status code returned to the caller.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// The message returned to the caller. Detail stays in the log.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::TemplateNotFound(_) => TEMPLATE_NOT_FOUND,
            Self::Unauthorized(_) => "Unauthorized",
            _ => TECHNICAL_ERROR,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<Self>() {
            return e.clone();
        }
        Self::ServerError(stack(&err))
    }
}

/// Flatten an error and its causes into a single line.
pub(crate) fn stack(err: &anyhow::Error) -> String {
    let stack = err.chain().fold(String::new(), |cause, e| format!("{cause} -> {e}"));
    stack.trim_start_matches(" -> ").to_string()
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

/// Construct an `Error::InvalidRequest` error from a string or existing error
/// value.
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::InvalidRequest(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::InvalidRequest(format!($err))
    };
}
pub(crate) use invalid;

#[cfg(test)]
mod test {
    use anyhow::{Context, anyhow};

    use super::*;

    #[test]
    fn anyhow_context() {
        let result = Err::<(), anyhow::Error>(anyhow!("one-off error")).context("error context");
        let err: Error = result.unwrap_err().into();
        assert_eq!(err, Error::ServerError("error context -> one-off error".to_string()));
        assert_eq!(err.message(), TECHNICAL_ERROR);
    }

    #[test]
    fn downcast_keeps_variant() {
        let err: Error = anyhow::Error::new(Error::TemplateNotFound("gone".to_string())).into();
        assert_eq!(err, Error::TemplateNotFound("gone".to_string()));
    }

    // Detail never leaks into the client-visible message.
    #[test]
    fn client_messages() {
        let err = Error::TemplateNotFound("/etc/presentation.json".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), TEMPLATE_NOT_FOUND);

        let err = Error::Upstream("502 Bad Gateway: upstream secret".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), TECHNICAL_ERROR);

        let err = Error::Unauthorized("api key mismatch".to_string());
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn invalid_macro() {
        let err = invalid!("missing state: '{}'", "");
        assert_eq!(err, Error::InvalidRequest("missing state: ''".to_string()));
    }
}
