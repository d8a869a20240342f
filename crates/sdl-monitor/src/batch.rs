//! Batch processing
//!
//! A batch is `{"Records": [{"Sns": {"Message": "<json>"}}, ...]}`. Items run
//! one after another in input order; a bad item is recorded and skipped,
//! never allowed to abort the rest of the batch.

use crate::classifier::{classify_message, unwrap_envelope};
use crate::dispatcher::{DispatchContext, Dispatcher};
use crate::error::{TransportContractError, ValidationError};
use crate::render::render_batch_rejection;
use chrono::{DateTime, Utc};
use sdl_common::response::{InvocationResponse, STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR, STATUS_OK};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Source of the processing instant for notifications without a timestamp
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemErrorKind {
    /// Envelope unreadable or inner message not JSON
    Envelope,
    /// Notification parsed but could not be classified
    Validation,
    /// Audit record not written
    Persistence,
    /// Chat notification not delivered
    Delivery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// Position of the item in `Records`
    pub index: usize,
    pub kind: ItemErrorKind,
    pub message: String,
}

impl ItemError {
    fn new(index: usize, kind: ItemErrorKind, message: impl Into<String>) -> Self {
        Self {
            index,
            kind,
            message: message.into(),
        }
    }

    fn from_validation(index: usize, err: &ValidationError) -> Self {
        let kind = match err {
            ValidationError::InvalidEnvelope(_) => ItemErrorKind::Envelope,
            ValidationError::MissingDetail | ValidationError::Malformed(_) => {
                ItemErrorKind::Validation
            },
        };
        Self::new(index, kind, err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Items that reached the dispatcher
    pub processed: usize,
    /// Envelope, validation, and persistence failures
    pub failures: Vec<ItemError>,
    /// Notifications not delivered; reported only, they do not fail the batch
    pub delivery_failures: Vec<ItemError>,
}

impl BatchResult {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn status_code(&self) -> u16 {
        if self.is_clean() {
            STATUS_OK
        } else {
            STATUS_INTERNAL_ERROR
        }
    }
}

/// Response body for a batch that was read
#[derive(Debug, Serialize)]
struct BatchSummary<'a> {
    message: String,
    invocation_id: &'a str,
    #[serde(flatten)]
    result: &'a BatchResult,
}

pub struct BatchProcessor {
    dispatcher: Dispatcher,
    clock: Clock,
}

impl BatchProcessor {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self::with_clock(dispatcher, Arc::new(Utc::now))
    }

    pub fn with_clock(dispatcher: Dispatcher, clock: Clock) -> Self {
        Self { dispatcher, clock }
    }

    /// Process every item in the batch.
    ///
    /// Fails only when the batch container itself is unusable; per-item
    /// problems are collected into the returned [`BatchResult`].
    #[instrument(skip(self, event), fields(items = tracing::field::Empty))]
    pub async fn process(
        &self,
        event: &Value,
        invocation_id: &str,
    ) -> Result<BatchResult, TransportContractError> {
        let records = event
            .get("Records")
            .ok_or(TransportContractError::MissingRecords)?
            .as_array()
            .ok_or(TransportContractError::RecordsNotAList)?;

        tracing::Span::current().record("items", records.len());

        let mut result = BatchResult::default();

        for (index, record) in records.iter().enumerate() {
            let classified = unwrap_envelope(record)
                .and_then(|message| classify_message(&message, (self.clock)()));

            let event = match classified {
                Ok(event) => event,
                Err(err) => {
                    warn!(index, error = %err, "Skipping unreadable notification");
                    result.failures.push(ItemError::from_validation(index, &err));
                    continue;
                },
            };

            let ctx = DispatchContext::new(format!("{}-{}", invocation_id, index));
            let outcome = self.dispatcher.dispatch(&event, &ctx).await;
            result.processed += 1;

            if let Err(err) = &outcome.delivery {
                result
                    .delivery_failures
                    .push(ItemError::new(index, ItemErrorKind::Delivery, err.to_string()));
            }
            if let Err(err) = &outcome.persistence {
                result
                    .failures
                    .push(ItemError::new(index, ItemErrorKind::Persistence, err.to_string()));
            }
        }

        info!(
            processed = result.processed,
            failures = result.failures.len(),
            delivery_failures = result.delivery_failures.len(),
            "Batch processed"
        );

        Ok(result)
    }

    /// Process a batch and produce the response for the invoking integration.
    pub async fn handle(&self, event: &Value, invocation_id: &str) -> InvocationResponse {
        match self.process(event, invocation_id).await {
            Ok(result) => {
                let message = if result.is_clean() {
                    "Notifications sent and audit records saved".to_string()
                } else {
                    format!("Batch completed with {} failed item(s)", result.failures.len())
                };

                InvocationResponse::json(
                    result.status_code(),
                    &BatchSummary {
                        message,
                        invocation_id,
                        result: &result,
                    },
                )
            },
            Err(err) => {
                warn!(invocation_id, error = %err, "Rejecting batch");

                if let Err(alert_err) = self
                    .dispatcher
                    .send_alert(&render_batch_rejection(&err))
                    .await
                {
                    warn!(error = %alert_err, "Batch rejection alert not delivered");
                }

                InvocationResponse::message(STATUS_BAD_REQUEST, err.to_string())
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::audit::{AuditKeyspace, ObjectStoreAuditWriter};
    use crate::chat::{ChatPayload, ChatSender};
    use crate::error::DeliveryError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use sdl_common::storage::memory::MemoryStore;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<ChatPayload>>,
    }

    #[async_trait]
    impl ChatSender for RecordingChat {
        async fn send(&self, payload: &ChatPayload) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn processor() -> (BatchProcessor, Arc<RecordingChat>, Arc<MemoryStore>) {
        let chat = Arc::new(RecordingChat::default());
        let store = Arc::new(MemoryStore::new("monitor-logs"));
        let dispatcher = Dispatcher::new(
            chat.clone(),
            Arc::new(ObjectStoreAuditWriter::new(store.clone())),
            AuditKeyspace::new("ops", "events"),
        );
        let clock: Clock = Arc::new(|| Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        (BatchProcessor::with_clock(dispatcher, clock), chat, store)
    }

    fn envelope(message: Value) -> Value {
        json!({"Sns": {"Message": message.to_string()}})
    }

    #[tokio::test]
    async fn test_missing_records_is_contract_error() {
        let (processor, chat, _) = processor();

        let err = processor.process(&json!({}), "inv").await.unwrap_err();
        assert_eq!(err, TransportContractError::MissingRecords);

        let err = processor
            .process(&json!({"Records": {"Sns": {}}}), "inv")
            .await
            .unwrap_err();
        assert_eq!(err, TransportContractError::RecordsNotAList);
        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_clean() {
        let (processor, _, store) = processor();
        let result = processor.process(&json!({"Records": []}), "inv").await.unwrap();

        assert_eq!(result, BatchResult::default());
        assert_eq!(result.status_code(), 200);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_bad_items_are_skipped_and_reported() {
        let (processor, chat, store) = processor();
        let batch = json!({"Records": [
            {"Sns": {}},
            {"Sns": {"Message": "not json"}},
            envelope(json!({"source": "aws.glue"})),
            envelope(json!({"detail": {"state": "RUNNING", "crawlerName": "raw"}})),
        ]});

        let result = processor.process(&batch, "inv").await.unwrap();

        assert_eq!(result.processed, 1);
        let kinds: Vec<_> = result.failures.iter().map(|f| (f.index, f.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0, ItemErrorKind::Envelope),
                (1, ItemErrorKind::Envelope),
                (2, ItemErrorKind::Validation),
            ]
        );
        assert_eq!(chat.sent.lock().unwrap().len(), 1);
        assert_eq!(
            store.keys(),
            vec!["ops/events/2024-05-01T08:00:00.000Z-inv-3.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_handle_summary_body() {
        let (processor, _, _) = processor();
        let batch = json!({"Records": [
            envelope(json!({"detail": {"state": "SUCCEEDED", "jobName": "load"}})),
        ]});

        let response = processor.handle(&batch, "inv-7").await;
        assert_eq!(response.status_code, 200);

        let body = response.body_json().unwrap();
        assert_eq!(body["message"], "Notifications sent and audit records saved");
        assert_eq!(body["invocation_id"], "inv-7");
        assert_eq!(body["processed"], 1);
        assert_eq!(body["failures"], json!([]));
        assert_eq!(body["delivery_failures"], json!([]));
    }

    #[tokio::test]
    async fn test_handle_rejected_batch_alerts_channel() {
        let (processor, chat, store) = processor();

        let response = processor.handle(&json!({"records": []}), "inv").await;

        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.body_json().unwrap(),
            json!("Invalid event format: Missing \"Records\" key")
        );
        let sent = chat.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![ChatPayload::text_only("Invalid event format: Missing \"Records\" key")]
        );
        assert!(store.keys().is_empty());
    }
}
