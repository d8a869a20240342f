//! Event classification
//!
//! Pure functions from a parsed notification to a [`ClassifiedEvent`]. The
//! processing instant is passed in so results are deterministic.

use crate::error::ValidationError;
use crate::event::{ClassifiedEvent, RawNotification, Severity, SubjectKind, TransportEnvelope};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Placeholder for a missing job or crawler name
pub const NOT_AVAILABLE: &str = "N/A";

/// State recorded when the notification carries none
pub const UNKNOWN_STATE: &str = "UNKNOWN";

/// Unwrap one batch item into its inner message string.
pub fn unwrap_envelope(record: &Value) -> Result<String, ValidationError> {
    TransportEnvelope::deserialize(record)
        .map(|envelope| envelope.sns.message)
        .map_err(|e| ValidationError::InvalidEnvelope(e.to_string()))
}

/// Parse the inner message, keeping the untyped value for alerting.
pub fn parse_notification(message: &str) -> Result<(RawNotification, Value), ValidationError> {
    let raw: Value = serde_json::from_str(message).map_err(|e| {
        ValidationError::InvalidEnvelope(format!("message is not valid JSON: {}", e))
    })?;

    let notification = RawNotification::deserialize(&raw)
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;

    Ok((notification, raw))
}

/// Classify a parsed notification.
///
/// Fails only when `detail` is absent. When both a job and a crawler name are
/// present, the job wins.
pub fn classify(
    notification: &RawNotification,
    raw: Value,
    now: DateTime<Utc>,
) -> Result<ClassifiedEvent, ValidationError> {
    let detail = notification
        .detail
        .as_ref()
        .ok_or(ValidationError::MissingDetail)?;

    let job = present(&detail.job_name);
    let crawler = present(&detail.crawler_name);

    let (subject_kind, subject_name) = match (job, crawler) {
        (Some(job), _) => (SubjectKind::Job, job),
        (None, Some(crawler)) => (SubjectKind::Crawler, crawler),
        (None, None) => (SubjectKind::Unknown, NOT_AVAILABLE),
    };

    let state = detail
        .state
        .clone()
        .unwrap_or_else(|| UNKNOWN_STATE.to_string());

    let timestamp = detail
        .timestamp
        .clone()
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

    Ok(ClassifiedEvent {
        subject_kind,
        subject_name: subject_name.to_string(),
        severity: severity_for(&state),
        state,
        timestamp,
        job_name: job.unwrap_or(NOT_AVAILABLE).to_string(),
        crawler_name: crawler.unwrap_or(NOT_AVAILABLE).to_string(),
        raw,
    })
}

/// Parse and classify in one step.
pub fn classify_message(message: &str, now: DateTime<Utc>) -> Result<ClassifiedEvent, ValidationError> {
    let (notification, raw) = parse_notification(message)?;
    classify(&notification, raw, now)
}

/// Severity is case-insensitive on the state name.
pub fn severity_for(state: &str) -> Severity {
    match state.to_ascii_uppercase().as_str() {
        "SUCCEEDED" => Severity::Success,
        "FAILED" | "TIMEOUT" | "STOPPED" => Severity::Failure,
        _ => Severity::Info,
    }
}

fn present(name: &Option<String>) -> Option<&str> {
    name.as_deref()
        .filter(|name| !name.trim().is_empty() && *name != NOT_AVAILABLE)
}
