//! Notification and event types
//!
//! Wire shapes (`TransportEnvelope`, `RawNotification`) deserialize with every
//! optional field optional; [`ClassifiedEvent`] is what the rest of the
//! pipeline works with.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One batch item: `{"Sns": {"Message": "<json string>"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct TransportEnvelope {
    #[serde(rename = "Sns")]
    pub sns: SnsPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnsPayload {
    /// JSON-encoded inner notification
    #[serde(rename = "Message")]
    pub message: String,
}

/// Parsed inner notification: `{"detail": {...}}`
///
/// Unknown top-level fields (`source`, `detail-type`, `time`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawNotification {
    #[serde(default)]
    pub detail: Option<NotificationDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetail {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub crawler_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// What kind of pipeline component an event describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Job,
    Crawler,
    Unknown,
}

impl SubjectKind {
    /// Human-readable label used in rendered messages
    pub fn label(self) -> &'static str {
        match self {
            SubjectKind::Job => "Glue Job",
            SubjectKind::Crawler => "Glue Crawler",
            SubjectKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Failure,
    Info,
}

impl Severity {
    pub fn marker(self) -> &'static str {
        match self {
            Severity::Success => "✅",
            Severity::Failure => "❌",
            Severity::Info => "ℹ️",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Failure => "failure",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification after classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedEvent {
    pub subject_kind: SubjectKind,
    /// Winning job/crawler name, `"N/A"` for unknown subjects
    pub subject_name: String,
    pub state: String,
    /// Payload timestamp, or the processing instant when the payload had none
    pub timestamp: String,
    pub severity: Severity,
    pub job_name: String,
    pub crawler_name: String,
    /// The inner notification as received, quoted in secondary alerts
    #[serde(skip)]
    pub raw: Value,
}
