//! Landing-to-processed object transform

use crate::error::{EtlError, Result};
use sdl_common::storage::ObjectStore;
use sdl_common::InvocationResponse;
use tracing::{debug, error, info, instrument};

/// Prefix of every object written to the processed bucket
pub const PROCESSED_PREFIX: &str = "processed/";

/// Uppercase every landing object into `processed/<key>`.
#[instrument(skip_all, fields(landing = landing.location(), processed = processed.location()))]
pub async fn process_landing(landing: &dyn ObjectStore, processed: &dyn ObjectStore) -> InvocationResponse {
    match transform_all(landing, processed).await {
        Ok(count) => {
            info!(count, "Landing objects processed");
            InvocationResponse::ok_message(format!("Processed {} files", count))
        },
        Err(e) => {
            error!(error = %e, "Landing transform failed");
            InvocationResponse::internal_error(format!("Error processing files: {}", e))
        },
    }
}

async fn transform_all(landing: &dyn ObjectStore, processed: &dyn ObjectStore) -> Result<usize> {
    let keys = landing.list("").await?;

    for key in &keys {
        let data = landing.get(key).await?;
        let content = String::from_utf8(data).map_err(|_| EtlError::NotUtf8 { key: key.clone() })?;

        let target = format!("{}{}", PROCESSED_PREFIX, key);
        processed
            .put(&target, content.to_uppercase().into_bytes(), None)
            .await?;
        debug!(source = %key, target = %target, "Object processed");
    }

    Ok(keys.len())
}
