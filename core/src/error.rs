//! Error types for the ioka API client.
//!
//! # Design
//! Local constraint failures (`Validation`) are kept apart from anything the
//! remote side said (`HttpError`) so callers can tell a rejected input from a
//! gateway decline or outage. Every non-2xx response lands in `HttpError`
//! with the raw status code and body. The client performs no recovery; every
//! variant is surfaced to the caller as-is.

use thiserror::Error;

/// A field of a request or response record violated its declared constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors returned by `Api` and the resource facades.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A record failed its field constraints before (or after) the round trip.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request never produced a response: DNS, connect, timeout, or body read.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server answered with a status outside 2xx.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Status code carried by an `HttpError`, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
