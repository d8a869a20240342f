//! Log record forwarding to the event bus

use crate::error::{EtlError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_eventbridge::error::DisplayErrorContext;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use aws_sdk_eventbridge::Client;
use sdl_common::response::{STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR};
use sdl_common::InvocationResponse;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

pub const LOG_SOURCE: &str = "aws.logs";
pub const LOG_DETAIL_TYPE: &str = "Glue Job/Crawler Log";
pub const DEFAULT_EVENT_BUS: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEvent {
    pub source: String,
    pub detail_type: String,
    /// JSON-encoded detail document
    pub detail: String,
    pub bus: String,
}

impl BusEvent {
    pub fn log_record(record: &Value) -> Self {
        Self {
            source: LOG_SOURCE.to_string(),
            detail_type: LOG_DETAIL_TYPE.to_string(),
            detail: record.to_string(),
            bus: DEFAULT_EVENT_BUS.to_string(),
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &BusEvent) -> Result<()>;
}

#[derive(Clone)]
pub struct EventBridgePublisher {
    client: Client,
}

impl EventBridgePublisher {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl EventPublisher for EventBridgePublisher {
    async fn publish(&self, event: &BusEvent) -> Result<()> {
        let entry = PutEventsRequestEntry::builder()
            .source(&event.source)
            .detail_type(&event.detail_type)
            .detail(&event.detail)
            .event_bus_name(&event.bus)
            .build();

        let output = self
            .client
            .put_events()
            .entries(entry)
            .send()
            .await
            .map_err(|e| EtlError::publish(DisplayErrorContext(&e).to_string()))?;

        // Rejected entries come back in a successful response.
        if let Some(rejected) = output.entries().iter().find(|entry| entry.error_code().is_some()) {
            return Err(EtlError::publish(format!(
                "{}: {}",
                rejected.error_code().unwrap_or_default(),
                rejected.error_message().unwrap_or_default()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ForwardFailure {
    message: String,
    failed: usize,
    total: usize,
}

/// Publish every element of `records` as its own bus event.
#[instrument(skip_all)]
pub async fn forward_logs(event: &Value, publisher: &dyn EventPublisher) -> InvocationResponse {
    let Some(records) = event.get("records").and_then(Value::as_array) else {
        warn!("Log batch has no records list");
        return InvocationResponse::message(
            STATUS_BAD_REQUEST,
            "Invalid event format: Missing \"records\" key",
        );
    };

    let mut failed = 0;
    for (index, record) in records.iter().enumerate() {
        if let Err(e) = publisher.publish(&BusEvent::log_record(record)).await {
            warn!(index, error = %e, "Log record not forwarded");
            failed += 1;
        }
    }

    if failed > 0 {
        return InvocationResponse::json(
            STATUS_INTERNAL_ERROR,
            &ForwardFailure {
                message: format!("Failed to forward {} of {} log records", failed, records.len()),
                failed,
                total: records.len(),
            },
        );
    }

    info!(count = records.len(), "Log records forwarded");
    InvocationResponse::ok_message("Logs forwarded to EventBridge")
}
