use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::is_credit_message;

/// Structured validation/build error surfaced before any network call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "{}: {}", field, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<String> for ValidationError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ValidationError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Required inputs that had neither an uploaded URL nor a typed value.
///
/// All missing names are collected before execution is aborted, so the user
/// sees the full list at once rather than one name per attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingInputsError {
    pub missing: Vec<String>,
}

impl MissingInputsError {
    pub fn new(missing: Vec<String>) -> Self {
        Self { missing }
    }
}

impl fmt::Display for MissingInputsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required inputs: {}", self.missing.join(", "))
    }
}

impl std::error::Error for MissingInputsError {}

/// Structured error envelope for non-2xx API responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Whether a 403 was classified as usage-quota exhaustion rather than an
    /// authorization failure.
    #[serde(default)]
    pub is_credit_error: bool,
    /// Raw response body for debugging (when available).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_body: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let is_credit_error = status == 403 && is_credit_message(&message);
        Self {
            status,
            message,
            is_credit_error,
            raw_body: None,
        }
    }

    pub fn with_raw_body(mut self, raw_body: impl Into<String>) -> Self {
        self.raw_body = Some(raw_body.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Payload error: the server answered 2xx but the body was not the JSON we
/// expected. Carries a short preview of the offending text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl PayloadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.preview {
            Some(preview) => write!(f, "{} (body: {})", self.message, preview),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for PayloadError {}

/// Convenience alias for fallible SDK results.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Transport-level error (timeouts, DNS/TLS/connectivity).
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    #[source]
    pub source: Option<reqwest::Error>,
}

/// Broad transport error kinds for classification.
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Other,
}

#[cfg(feature = "client")]
impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Other => "transport",
        };
        write!(f, "{label}")
    }
}

/// Unified error type surfaced by the SDK.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    MissingInputs(#[from] MissingInputsError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Payload(#[from] PayloadError),

    #[error("configuration error: {0}")]
    Config(String),

    #[cfg(feature = "client")]
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Background execution task panicked or was aborted before completion.
    #[cfg(feature = "client")]
    #[error("background execution failed: {0}")]
    Background(String),
}
