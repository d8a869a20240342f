use crate::env;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack)
    pub endpoint: Option<String>,
    pub path_style: bool,
}

impl StorageConfig {
    /// Build from the environment, reading the bucket name from `bucket_var`.
    ///
    /// `S3_ENDPOINT` and `S3_PATH_STYLE` are shared by every bucket.
    pub fn from_env(bucket_var: &str) -> Result<Self> {
        Ok(Self {
            bucket: env::required_var(bucket_var)?,
            endpoint: env::optional_var("S3_ENDPOINT"),
            path_style: env::parse_var("S3_PATH_STYLE", false)?,
        })
    }
}
