//! Job and crawler triggers

use crate::config::PipelineNames;
use crate::engine::EtlEngine;
use crate::error::{EtlError, Result};
use sdl_common::response::STATUS_BAD_REQUEST;
use sdl_common::InvocationResponse;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub const JOB_STARTED: &str = "Glue job started successfully";

/// How long `crawl_then_run` waits for the crawler to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            max_attempts: 120,
        }
    }
}

#[instrument(skip_all, fields(job = %names.job_name()))]
pub async fn start_job(engine: &dyn EtlEngine, names: &PipelineNames) -> InvocationResponse {
    match engine.start_job_run(&names.job_name()).await {
        Ok(run_id) => {
            info!(run_id = %run_id, "Started Glue job");
            InvocationResponse::ok_message(JOB_STARTED)
        },
        Err(e) => {
            error!(error = %e, "Failed to start Glue job");
            InvocationResponse::internal_error(format!("Error starting Glue job: {}", e))
        },
    }
}

/// Start the crawler, but only from `READY`.
#[instrument(skip_all, fields(crawler = %names.crawler_name()))]
pub async fn start_crawler(engine: &dyn EtlEngine, names: &PipelineNames) -> InvocationResponse {
    let crawler = names.crawler_name();

    let result = async {
        let state = engine.crawler_state(&crawler).await?;
        if !state.is_ready() {
            return Ok(Some(state));
        }
        engine.start_crawler(&crawler).await?;
        Ok::<_, EtlError>(None)
    }
    .await;

    match result {
        Ok(None) => {
            info!("Started crawler");
            InvocationResponse::ok_message(format!("Crawler {} started successfully", crawler))
        },
        Ok(Some(state)) => {
            let message = format!(
                "Crawler {} is currently {} and cannot be started.",
                crawler, state
            );
            warn!(state = %state, "Crawler busy");
            InvocationResponse::message(STATUS_BAD_REQUEST, message)
        },
        Err(e) => {
            error!(error = %e, "Failed to start crawler");
            InvocationResponse::internal_error(format!("Error starting Glue crawler: {}", e))
        },
    }
}

/// Start the crawler, wait for it to finish, then start the job.
#[instrument(skip_all, fields(crawler = %names.crawler_name(), job = %names.job_name()))]
pub async fn crawl_then_run(
    engine: &dyn EtlEngine,
    names: &PipelineNames,
    policy: WaitPolicy,
) -> InvocationResponse {
    let result = async {
        let crawler = names.crawler_name();
        engine.start_crawler(&crawler).await?;
        info!("Started crawler");

        wait_until_ready(engine, &crawler, policy).await?;
        info!("Crawler completed");

        engine.start_job_run(&names.job_name()).await
    }
    .await;

    match result {
        Ok(run_id) => {
            info!(run_id = %run_id, "Started Glue job");
            InvocationResponse::ok_message(JOB_STARTED)
        },
        Err(e) => {
            error!(error = %e, "Crawl-then-run failed");
            InvocationResponse::internal_error(format!("Error starting Glue job: {}", e))
        },
    }
}

/// Poll until the crawler reports `READY`. Sleeps before each check, since a
/// crawler that was just started may not have left `READY` yet.
async fn wait_until_ready(engine: &dyn EtlEngine, crawler: &str, policy: WaitPolicy) -> Result<()> {
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        let state = engine.crawler_state(crawler).await?;
        debug!(attempt, state = %state, "Polled crawler");
        if state.is_ready() {
            return Ok(());
        }
    }

    Err(EtlError::CrawlerTimeout {
        crawler: crawler.to_string(),
        attempts: policy.max_attempts,
    })
}
