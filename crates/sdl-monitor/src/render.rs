//! Message rendering for the chat channel

use crate::chat::ChatPayload;
use crate::error::{DeliveryError, TransportContractError};
use crate::event::{ClassifiedEvent, SubjectKind};
use serde_json::Value;

pub const DELIVERY_FAILURE_TITLE: &str = "Notification Delivery Failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub title: String,
    pub body: String,
    pub marker: &'static str,
}

impl RenderedMessage {
    /// Body prefixed with the severity marker, as posted to the channel
    pub fn text(&self) -> String {
        format!("{} {}", self.marker, self.body)
    }
}

impl From<&RenderedMessage> for ChatPayload {
    fn from(message: &RenderedMessage) -> Self {
        ChatPayload::titled(message.title.clone(), message.text())
    }
}

pub fn render(event: &ClassifiedEvent) -> RenderedMessage {
    let (title, body) = match event.subject_kind {
        SubjectKind::Job | SubjectKind::Crawler => {
            let subject = format!("{} '{}'", event.subject_kind.label(), event.subject_name);
            (
                format!("{} State Change", subject),
                format!(
                    "{} has reached state: {} at {}",
                    subject, event.state, event.timestamp
                ),
            )
        },
        SubjectKind::Unknown => (
            "Unknown State Change Detected".to_string(),
            format!(
                "Unknown state change detected: {} at {}",
                event.state, event.timestamp
            ),
        ),
    };

    RenderedMessage {
        title,
        body,
        marker: event.severity.marker(),
    }
}

/// Secondary alert sent after the primary notification was not delivered.
pub fn render_delivery_failure(error: &DeliveryError, raw_event: &Value) -> ChatPayload {
    let text = match error {
        DeliveryError::Status { status, .. } => format!(
            "Error {}: Failed to send notification. Event details: {}",
            status, raw_event
        ),
        DeliveryError::Transport(description) => {
            format!("Exception: {}. Event details: {}", description, raw_event)
        },
    };

    ChatPayload::titled(DELIVERY_FAILURE_TITLE, text)
}

/// Direct alert for a batch that could not be read at all.
pub fn render_batch_rejection(error: &TransportContractError) -> ChatPayload {
    ChatPayload::text_only(error.to_string())
}
