//! Error taxonomy shared by the synthesis pipeline and the HTTP layer.
//!
//! Validation problems (bad body, unknown format, unresolvable voice,
//! invalid trigger pattern) are 400s and are raised before any synthesis
//! work. Backend and encoder failures are 500s. Every error serializes to
//! the same wire shape: `{ "error": <category>, "details": <diagnostic> }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("content-type is not application/json: {0}")]
    BadContentType(String),

    #[error("error occurred while deserializing json: {0}")]
    BadJson(String),

    #[error("response format '{0}' is not supported")]
    UnsupportedFormat(String),

    #[error("voice '{0}' not found")]
    VoiceNotFound(String),

    #[error("no voice bound to culture '{0}'")]
    CultureUnbound(String),

    #[error("invalid trigger pattern for culture '{culture}': {source}")]
    BadTriggerPattern {
        culture: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to list voices: {0}")]
    VoiceListing(String),

    #[error("failed to speak: {0}")]
    Synthesis(String),

    #[error("failed to convert: {0}")]
    Encoding(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadContentType(_)
            | Self::BadJson(_)
            | Self::UnsupportedFormat(_)
            | Self::VoiceNotFound(_)
            | Self::CultureUnbound(_)
            | Self::BadTriggerPattern { .. } => StatusCode::BAD_REQUEST,
            Self::VoiceListing(_) | Self::Synthesis(_) | Self::Encoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short category string used in the wire error body.
    pub fn category(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => "malformed body",
            _ => "internal error",
        }
    }
}

/// Wire shape of every error response, including the 404 fallback.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody::new(self.category(), self.to_string());
        (self.status(), Json(body)).into_response()
    }
}
