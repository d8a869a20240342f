//! ETL engine seam and its Glue implementation

use crate::error::{EtlError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_glue::error::DisplayErrorContext;
use aws_sdk_glue::types::CrawlerState as GlueCrawlerState;
use aws_sdk_glue::Client;
use std::fmt;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlerState {
    Ready,
    Running,
    Stopping,
    Other(String),
}

impl CrawlerState {
    pub fn as_str(&self) -> &str {
        match self {
            CrawlerState::Ready => "READY",
            CrawlerState::Running => "RUNNING",
            CrawlerState::Stopping => "STOPPING",
            CrawlerState::Other(state) => state,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, CrawlerState::Ready)
    }
}

impl fmt::Display for CrawlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait EtlEngine: Send + Sync {
    /// Start a run of `job_name`, returning the run id
    async fn start_job_run(&self, job_name: &str) -> Result<String>;

    async fn crawler_state(&self, crawler_name: &str) -> Result<CrawlerState>;

    async fn start_crawler(&self, crawler_name: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct GlueEngine {
    client: Client,
}

impl GlueEngine {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl EtlEngine for GlueEngine {
    #[instrument(skip(self))]
    async fn start_job_run(&self, job_name: &str) -> Result<String> {
        let output = self
            .client
            .start_job_run()
            .job_name(job_name)
            .send()
            .await
            .map_err(|e| EtlError::engine(DisplayErrorContext(&e).to_string()))?;

        let run_id = output.job_run_id().unwrap_or_default().to_string();
        debug!(run_id = %run_id, "Job run started");
        Ok(run_id)
    }

    #[instrument(skip(self))]
    async fn crawler_state(&self, crawler_name: &str) -> Result<CrawlerState> {
        let output = self
            .client
            .get_crawler()
            .name(crawler_name)
            .send()
            .await
            .map_err(|e| EtlError::engine(DisplayErrorContext(&e).to_string()))?;

        let state = match output.crawler().and_then(|crawler| crawler.state()) {
            Some(GlueCrawlerState::Ready) => CrawlerState::Ready,
            Some(GlueCrawlerState::Running) => CrawlerState::Running,
            Some(GlueCrawlerState::Stopping) => CrawlerState::Stopping,
            Some(other) => CrawlerState::Other(other.as_str().to_string()),
            None => return Err(EtlError::engine(format!("Crawler {} reported no state", crawler_name))),
        };

        Ok(state)
    }

    #[instrument(skip(self))]
    async fn start_crawler(&self, crawler_name: &str) -> Result<()> {
        self.client
            .start_crawler()
            .name(crawler_name)
            .send()
            .await
            .map_err(|e| EtlError::engine(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawler_state_display() {
        assert_eq!(CrawlerState::Ready.to_string(), "READY");
        assert_eq!(CrawlerState::Other("UNKNOWN".into()).to_string(), "UNKNOWN");
        assert!(!CrawlerState::Stopping.is_ready());
    }
}
