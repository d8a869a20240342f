//! Audit records and their persistence
//!
//! One record per dispatched event, stored under
//! `{database}/{table}/{timestamp}-{disambiguator}.json`. Events sharing a
//! timestamp land under different keys as long as their disambiguators
//! differ; reusing a disambiguator overwrites.

use crate::error::PersistenceError;
use crate::event::{ClassifiedEvent, Severity, SubjectKind};
use crate::render::RenderedMessage;
use async_trait::async_trait;
use sdl_common::storage::ObjectStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub state: String,
    pub subject_kind: SubjectKind,
    pub job_name: String,
    pub crawler_name: String,
    pub timestamp: String,
    pub severity: Severity,
    /// Rendered notification body
    pub message: String,
    pub disambiguator: String,
}

impl AuditRecord {
    pub fn new(event: &ClassifiedEvent, rendered: &RenderedMessage, disambiguator: &str) -> Self {
        Self {
            state: event.state.clone(),
            subject_kind: event.subject_kind,
            job_name: event.job_name.clone(),
            crawler_name: event.crawler_name.clone(),
            timestamp: event.timestamp.clone(),
            severity: event.severity,
            message: rendered.body.clone(),
            disambiguator: disambiguator.to_string(),
        }
    }
}

/// Database/table namespace the audit keys live under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditKeyspace {
    database: String,
    table: String,
}

impl AuditKeyspace {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    /// Both segments come from outside input, so any `/` in them becomes `-`
    /// to keep every record directly under `{database}/{table}/`.
    pub fn key(&self, timestamp: &str, disambiguator: &str) -> String {
        format!(
            "{}/{}/{}-{}.json",
            self.database,
            self.table,
            flatten_segment(timestamp),
            flatten_segment(disambiguator)
        )
    }
}

fn flatten_segment(segment: &str) -> String {
    segment.replace('/', "-")
}

#[async_trait]
pub trait AuditWriter: Send + Sync {
    async fn write(&self, key: &str, record: &AuditRecord) -> Result<(), PersistenceError>;
}

/// Writes records as JSON objects into an [`ObjectStore`]
pub struct ObjectStoreAuditWriter {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreAuditWriter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditWriter for ObjectStoreAuditWriter {
    async fn write(&self, key: &str, record: &AuditRecord) -> Result<(), PersistenceError> {
        let body = serde_json::to_vec(record)?;

        self.store
            .put(key, body, Some("application/json"))
            .await
            .map_err(|source| PersistenceError::Write {
                key: key.to_string(),
                source,
            })?;

        debug!(bucket = self.store.location(), key, "Audit record written");
        Ok(())
    }
}
