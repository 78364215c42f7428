//! Error types for the reservations API client.
//!
//! # Design
//! `Payload` carries the backend's own `error` message untouched, since that
//! text is what the front end shows to the user. Cancellation never shows up
//! here: an aborted request resolves with its fallback value instead.

use thiserror::Error;

/// Errors returned by `ReservationsClient` and `ApiClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The response envelope carried an `error` field.
    #[error("{message}")]
    Payload { status: u16, message: String },

    /// A non-2xx response without an `error` field (strict mode only).
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a complete response.
    #[error("transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A record submitted for creation already carries an identifier.
    #[error("new {resource} must not carry an identifier")]
    UnexpectedIdentifier { resource: &'static str },

    /// A record that must carry an identifier does not.
    #[error("{resource} has no identifier")]
    MissingIdentifier { resource: &'static str },
}

impl ApiError {
    /// HTTP status of the response behind this error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Payload { status, .. } | ApiError::HttpError { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
