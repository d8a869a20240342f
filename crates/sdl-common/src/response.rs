//! Invocation response returned to the triggering integration
//!
//! Serialized as `{"statusCode": <u16>, "body": "<json string>"}`. The body is
//! itself JSON-encoded, so a plain message becomes a quoted JSON string.

use serde::{Deserialize, Serialize};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    /// Build a response whose body is the JSON encoding of `body`.
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        let body = serde_json::to_string(body).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode response body");
            String::from("\"response body could not be encoded\"")
        });
        Self { status_code, body }
    }

    pub fn message(status_code: u16, message: impl Into<String>) -> Self {
        Self::json(status_code, &message.into())
    }

    pub fn ok_message(message: impl Into<String>) -> Self {
        Self::message(STATUS_OK, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::message(STATUS_BAD_REQUEST, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::message(STATUS_INTERNAL_ERROR, message)
    }

    /// Decode the body back into a JSON value.
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}
