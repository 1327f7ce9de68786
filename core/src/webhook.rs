//! Decoding of event notifications pushed by the gateway.
//!
//! Signatures are not checked; callers that need authenticity must verify
//! the request before handing the body over.

use crate::client::decode_valid;
use crate::error::ApiError;
use crate::types::Event;

#[derive(Debug, Clone, Copy, Default)]
pub struct Webhook;

impl Webhook {
    /// Parses a webhook body into the `Event` it describes.
    pub fn parse_event(&self, body: &[u8]) -> Result<Event, ApiError> {
        let value = serde_json::from_slice(body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        decode_valid(value)
    }
}
