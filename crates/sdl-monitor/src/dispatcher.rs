//! Notification dispatch
//!
//! Render, deliver (with one secondary alert on failure), then persist. Each
//! step is failure-tolerant and the audit write happens whatever the chat
//! endpoint did.

use crate::audit::{AuditKeyspace, AuditRecord, AuditWriter};
use crate::chat::{ChatPayload, ChatSender};
use crate::error::{DeliveryError, PersistenceError};
use crate::event::ClassifiedEvent;
use crate::render::{render, render_delivery_failure};
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Span};

/// Per-item dispatch parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    /// Unique token appended to the audit key
    pub disambiguator: String,
}

impl DispatchContext {
    pub fn new(disambiguator: impl Into<String>) -> Self {
        Self {
            disambiguator: disambiguator.into(),
        }
    }
}

#[derive(Debug)]
pub struct DispatchOutcome {
    pub audit_key: String,
    pub delivery: Result<(), DeliveryError>,
    /// Only attempted when `delivery` failed
    pub secondary_alert: Option<Result<(), DeliveryError>>,
    pub persistence: Result<(), PersistenceError>,
}

impl DispatchOutcome {
    pub fn notified(&self) -> bool {
        self.delivery.is_ok()
    }

    pub fn persisted(&self) -> bool {
        self.persistence.is_ok()
    }
}

pub struct Dispatcher {
    chat: Arc<dyn ChatSender>,
    audit: Arc<dyn AuditWriter>,
    keyspace: AuditKeyspace,
}

impl Dispatcher {
    pub fn new(chat: Arc<dyn ChatSender>, audit: Arc<dyn AuditWriter>, keyspace: AuditKeyspace) -> Self {
        Self {
            chat,
            audit,
            keyspace,
        }
    }

    #[instrument(
        skip_all,
        fields(
            subject_kind = %event.subject_kind,
            subject = %event.subject_name,
            state = %event.state,
            audit_key = tracing::field::Empty,
        )
    )]
    pub async fn dispatch(&self, event: &ClassifiedEvent, ctx: &DispatchContext) -> DispatchOutcome {
        let rendered = render(event);

        let delivery = self.chat.send(&ChatPayload::from(&rendered)).await;
        let secondary_alert = match &delivery {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "Notification not delivered, sending secondary alert");
                Some(self.send_secondary_alert(err, event).await)
            },
        };

        let audit_key = self.keyspace.key(&event.timestamp, &ctx.disambiguator);
        Span::current().record("audit_key", audit_key.as_str());

        let record = AuditRecord::new(event, &rendered, &ctx.disambiguator);
        let persistence = self.audit.write(&audit_key, &record).await;

        match &persistence {
            Ok(()) => info!(notified = delivery.is_ok(), "Event dispatched"),
            Err(err) => error!(error = %err, "Audit record not written"),
        }

        DispatchOutcome {
            audit_key,
            delivery,
            secondary_alert,
            persistence,
        }
    }

    /// Post a standalone alert to the channel (no fallback).
    pub async fn send_alert(&self, payload: &ChatPayload) -> Result<(), DeliveryError> {
        self.chat.send(payload).await
    }

    async fn send_secondary_alert(
        &self,
        failure: &DeliveryError,
        event: &ClassifiedEvent,
    ) -> Result<(), DeliveryError> {
        let result = self
            .chat
            .send(&render_delivery_failure(failure, &event.raw))
            .await;

        // Never escalated further; a failing channel must not loop.
        if let Err(err) = &result {
            warn!(error = %err, "Secondary alert also failed");
        }

        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::audit::ObjectStoreAuditWriter;
    use crate::event::{Severity, SubjectKind};
    use async_trait::async_trait;
    use sdl_common::storage::memory::MemoryStore;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies with scripted results in order, then succeeds.
    #[derive(Default)]
    struct ScriptedChat {
        replies: Mutex<VecDeque<Result<(), DeliveryError>>>,
        sent: Mutex<Vec<ChatPayload>>,
    }

    impl ScriptedChat {
        fn replying(replies: Vec<Result<(), DeliveryError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                sent: Mutex::default(),
            }
        }

        fn sent(&self) -> Vec<ChatPayload> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatSender for ScriptedChat {
        async fn send(&self, payload: &ChatPayload) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(payload.clone());
            self.replies.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn failed_job() -> ClassifiedEvent {
        ClassifiedEvent {
            subject_kind: SubjectKind::Job,
            subject_name: "nightly-etl".to_string(),
            state: "FAILED".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            severity: Severity::Failure,
            job_name: "nightly-etl".to_string(),
            crawler_name: "N/A".to_string(),
            raw: json!({"detail": {"state": "FAILED", "jobName": "nightly-etl"}}),
        }
    }

    fn setup(chat: Arc<ScriptedChat>) -> (Dispatcher, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new("monitor-logs"));
        let dispatcher = Dispatcher::new(
            chat,
            Arc::new(ObjectStoreAuditWriter::new(store.clone())),
            AuditKeyspace::new("ops", "events"),
        );
        (dispatcher, store)
    }

    #[tokio::test]
    async fn test_successful_dispatch_sends_once_and_persists() {
        let chat = Arc::new(ScriptedChat::default());
        let (dispatcher, store) = setup(chat.clone());

        let outcome = dispatcher
            .dispatch(&failed_job(), &DispatchContext::new("inv-0"))
            .await;

        assert!(outcome.notified());
        assert!(outcome.persisted());
        assert!(outcome.secondary_alert.is_none());
        assert_eq!(outcome.audit_key, "ops/events/2024-01-01T00:00:00Z-inv-0.json");
        assert_eq!(chat.sent().len(), 1);
        assert_eq!(
            chat.sent()[0].title.as_deref(),
            Some("Glue Job 'nightly-etl' State Change")
        );
        assert!(store.object(&outcome.audit_key).is_some());
    }

    #[tokio::test]
    async fn test_status_failure_sends_one_secondary_alert_and_still_persists() {
        let chat = Arc::new(ScriptedChat::replying(vec![Err(DeliveryError::Status {
            status: 500,
            body: String::new(),
        })]));
        let (dispatcher, store) = setup(chat.clone());

        let outcome = dispatcher
            .dispatch(&failed_job(), &DispatchContext::new("inv-0"))
            .await;

        assert!(!outcome.notified());
        assert!(matches!(outcome.secondary_alert, Some(Ok(()))));
        assert!(outcome.persisted());

        let sent = chat.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].text.contains("Error 500"));
        assert!(sent[1].text.contains("\"jobName\":\"nightly-etl\""));
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_secondary_alert_is_not_retried() {
        let chat = Arc::new(ScriptedChat::replying(vec![
            Err(DeliveryError::Transport("connection refused".to_string())),
            Err(DeliveryError::Transport("connection refused".to_string())),
        ]));
        let (dispatcher, store) = setup(chat.clone());

        let outcome = dispatcher
            .dispatch(&failed_job(), &DispatchContext::new("inv-0"))
            .await;

        assert!(matches!(outcome.secondary_alert, Some(Err(_))));
        assert_eq!(chat.sent().len(), 2);
        assert!(chat.sent()[1].text.starts_with("Exception: connection refused."));
        assert!(outcome.persisted());
        assert_eq!(store.keys().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() {
        let chat = Arc::new(ScriptedChat::default());
        let (dispatcher, store) = setup(chat);
        store.fail_puts(true);

        let outcome = dispatcher
            .dispatch(&failed_job(), &DispatchContext::new("inv-0"))
            .await;

        assert!(outcome.notified());
        assert!(!outcome.persisted());
    }

    #[tokio::test]
    async fn test_disambiguator_controls_overwrite() {
        let chat = Arc::new(ScriptedChat::default());
        let (dispatcher, store) = setup(chat);
        let event = failed_job();

        dispatcher.dispatch(&event, &DispatchContext::new("a")).await;
        dispatcher.dispatch(&event, &DispatchContext::new("b")).await;
        assert_eq!(store.keys().len(), 2);

        dispatcher.dispatch(&event, &DispatchContext::new("b")).await;
        assert_eq!(store.keys().len(), 2);
        assert_eq!(store.put_count(), 3);
    }
}
