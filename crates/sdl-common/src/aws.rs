//! Shared AWS SDK configuration loading
//!
//! Credentials always come from the default provider chain (environment,
//! profile, or the execution role of the hosting function).

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;
use tracing::debug;

/// Load the SDK configuration, optionally pinning the region.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }

    let config = loader.load().await;
    debug!(region = ?config.region(), "Loaded AWS SDK configuration");
    config
}
