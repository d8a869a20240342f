//! Error taxonomy for the notification pipeline
//!
//! Only [`TransportContractError`] ends a batch early. Validation errors are
//! per item, delivery errors are recorded after the single secondary alert,
//! and persistence errors are recorded without retry.

use sdl_common::SdlError;
use thiserror::Error;

/// The batch container itself is not the expected envelope collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportContractError {
    #[error("Invalid event format: Missing \"Records\" key")]
    MissingRecords,

    #[error("Invalid event format: \"Records\" is not a list")]
    RecordsNotAList,
}

/// One notification in the batch could not be turned into an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Envelope lacks `Sns.Message`, or the message is not JSON
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Notification has no \"detail\" object")]
    MissingDetail,

    /// `detail` is present but has the wrong shape
    #[error("Malformed notification: {0}")]
    Malformed(String),
}

/// The chat endpoint did not accept a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Chat webhook returned HTTP {status}")]
    Status { status: u16, body: String },

    /// Connection, TLS, or timeout failure before any response arrived
    #[error("Chat webhook unreachable: {0}")]
    Transport(String),
}

/// The audit record could not be stored.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write audit record {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: SdlError,
    },
}
