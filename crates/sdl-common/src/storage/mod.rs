//! Object storage
//!
//! [`ObjectStore`] is the seam the audit writer and the landing transform
//! depend on; [`Storage`] implements it over S3.

use crate::error::{Result, SdlError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream, Client};
use tracing::{debug, info, instrument};

pub mod config;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use config::StorageConfig;

/// Minimal keyed object store scoped to a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket (or equivalent namespace) this store writes to
    fn location(&self) -> &str;

    /// Write an object, replacing any existing object under `key`
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// All keys under `prefix`, following pagination to the end
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub fn new(config: StorageConfig, sdk_config: &SdkConfig) -> Self {
        let mut builder =
            aws_sdk_s3::config::Builder::from(sdk_config).force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!(bucket = %config.bucket, endpoint = ?config.endpoint, "Storage client initialized");

        Self {
            client,
            bucket: config.bucket,
        }
    }

    /// Same client, different bucket
    pub fn with_bucket(&self, bucket: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            bucket: bucket.into(),
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for Storage {
    fn location(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, data), fields(bucket = %self.bucket))]
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        debug!("Uploading {} bytes to {}", data.len(), self.object_url(key));

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.map_err(|e| {
            SdlError::storage(format!(
                "Failed to upload {}: {}",
                self.object_url(key),
                DisplayErrorContext(&e)
            ))
        })?;

        debug!("Uploaded {}", self.object_url(key));
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                SdlError::storage(format!(
                    "Failed to download {}: {}",
                    self.object_url(key),
                    DisplayErrorContext(&e)
                ))
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| SdlError::storage(format!("Failed to read S3 response body: {}", e)))?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from {}", data.len(), self.object_url(key));
        Ok(data)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation.take() {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(|e| {
                SdlError::storage(format!(
                    "Failed to list s3://{}/{}: {}",
                    self.bucket,
                    prefix,
                    DisplayErrorContext(&e)
                ))
            })?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(|k| k.to_string())),
            );

            match response.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        debug!("Listed {} objects under s3://{}/{}", keys.len(), self.bucket, prefix);
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_storage(bucket: &str) -> Storage {
        Storage {
            client: Client::from_conf(aws_sdk_s3::Config::builder().build()),
            bucket: bucket.to_string(),
        }
    }

    #[test]
    fn test_object_url() {
        let storage = offline_storage("monitor-logs");
        assert_eq!(
            storage.object_url("ops/events/2024-01-01T00:00:00Z-abc-0.json"),
            "s3://monitor-logs/ops/events/2024-01-01T00:00:00Z-abc-0.json"
        );
    }

    #[test]
    fn test_with_bucket_switches_location() {
        let landing = offline_storage("landing");
        let processed = landing.with_bucket("processed");
        assert_eq!(landing.location(), "landing");
        assert_eq!(processed.location(), "processed");
    }
}
