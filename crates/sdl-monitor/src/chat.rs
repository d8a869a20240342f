//! Chat channel delivery
//!
//! [`ChatSender`] is the seam the dispatcher talks to; [`WebhookChatSender`]
//! posts JSON to an incoming-webhook URL (Microsoft Teams style).

use crate::error::DeliveryError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Longest response body kept on a [`DeliveryError::Status`]
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Body posted to the webhook: `{"text": ...}` or `{"title": ..., "text": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
    pub text: String,
}

impl ChatPayload {
    pub fn titled(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            text: text.into(),
        }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Post one message; any non-2xx status is an error.
    async fn send(&self, payload: &ChatPayload) -> Result<(), DeliveryError>;
}

pub struct WebhookChatSender {
    client: Client,
    webhook_url: String,
}

impl WebhookChatSender {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

#[async_trait]
impl ChatSender for WebhookChatSender {
    async fn send(&self, payload: &ChatPayload) -> Result<(), DeliveryError> {
        // The webhook URL embeds its credential, so it is stripped from errors.
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Chat message delivered");
            return Ok(());
        }

        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect();

        Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn sender(url: String) -> WebhookChatSender {
        WebhookChatSender::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_payload_shapes() {
        assert_eq!(
            serde_json::to_value(ChatPayload::text_only("hi")).unwrap(),
            json!({"text": "hi"})
        );
        assert_eq!(
            serde_json::to_value(ChatPayload::titled("t", "hi")).unwrap(),
            json!({"title": "t", "text": "hi"})
        );
    }

    #[tokio::test]
    async fn test_send_posts_json_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/webhook"))
            .and(body_json(json!({"title": "Glue Job 'a' State Change", "text": "✅ done"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("1"))
            .expect(1)
            .mount(&server)
            .await;

        let result = sender(format!("{}/webhook", server.uri()))
            .send(&ChatPayload::titled("Glue Job 'a' State Change", "✅ done"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Bad payload received by generic incoming webhook."))
            .mount(&server)
            .await;

        let err = sender(server.uri())
            .send(&ChatPayload::text_only("x"))
            .await
            .unwrap_err();

        match err {
            DeliveryError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.starts_with("Bad payload"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_transport_error() {
        // Mock servers are pooled and keep listening after drop, so use a
        // port that was bound and released instead.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let url = format!("http://127.0.0.1:{port}/webhook");

        let err = sender(url.clone())
            .send(&ChatPayload::text_only("x"))
            .await
            .unwrap_err();

        match err {
            DeliveryError::Transport(message) => assert!(!message.contains(&url)),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
