//! SDL ETL - pipeline trigger and maintenance tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sdl_common::aws::load_sdk_config;
use sdl_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use sdl_common::storage::Storage;
use sdl_common::InvocationResponse;
use sdl_etl::config::MISSING_PIPELINE_VARS;
use sdl_etl::{
    crawl_then_run, forward_logs, process_landing, start_crawler, start_job, EventBridgePublisher,
    GlueEngine, PipelineNames, TaskConfig, WaitPolicy,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "sdl-etl")]
#[command(author, version, about = "SDL pipeline trigger and maintenance tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a run of the pipeline's Glue job
    StartJob,

    /// Start the pipeline's crawler if it is idle
    StartCrawler,

    /// Run the crawler to completion, then start the job
    CrawlThenRun {
        /// Seconds between crawler state checks
        #[arg(long, default_value_t = 15)]
        poll_interval_secs: u64,

        /// Checks before giving up
        #[arg(long, default_value_t = 120)]
        max_attempts: u32,
    },

    /// Uppercase every landing object into the processed bucket
    ProcessLanding,

    /// Forward a batch of log records to the event bus
    ForwardLogs {
        /// Log batch JSON ("-" reads stdin)
        #[arg(short, long, default_value = "-")]
        event: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Console)
        .log_file_prefix("sdl-etl")
        .filter_directives("aws_config=warn,aws_smithy_runtime=warn,hyper=warn")
        .build();

    // Environment takes precedence
    let log_config = log_config.merge_env_or_keep();

    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        },
    };

    dotenvy::dotenv().ok();

    match run(cli.command).await {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            },
            Err(e) => {
                eprintln!("Error: failed to encode response: {e}");
                ExitCode::FAILURE
            },
        },
        Err(e) => {
            error!(error = %e, "sdl-etl failed to start");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run(command: Command) -> Result<InvocationResponse> {
    let response = match command {
        Command::StartJob => {
            let Some(names) = pipeline_names() else {
                return Ok(InvocationResponse::bad_request(MISSING_PIPELINE_VARS));
            };
            let engine = GlueEngine::new(&load_sdk_config(None).await);
            start_job(&engine, &names).await
        },

        Command::StartCrawler => {
            let Some(names) = pipeline_names() else {
                return Ok(InvocationResponse::bad_request(MISSING_PIPELINE_VARS));
            };
            let engine = GlueEngine::new(&load_sdk_config(None).await);
            start_crawler(&engine, &names).await
        },

        Command::CrawlThenRun {
            poll_interval_secs,
            max_attempts,
        } => {
            let Some(names) = pipeline_names() else {
                return Ok(InvocationResponse::bad_request(MISSING_PIPELINE_VARS));
            };
            let policy = WaitPolicy {
                interval: Duration::from_secs(poll_interval_secs),
                max_attempts,
            };
            let engine = GlueEngine::new(&load_sdk_config(None).await);
            crawl_then_run(&engine, &names, policy).await
        },

        Command::ProcessLanding => {
            let config = TaskConfig::from_env().context("Invalid landing transform configuration")?;
            let sdk_config = load_sdk_config(config.region.as_deref()).await;

            let landing = Storage::new(config.landing, &sdk_config);
            let processed = landing.with_bucket(config.processed_bucket);
            process_landing(&landing, &processed).await
        },

        Command::ForwardLogs { event } => {
            let event = read_event(&event)?;
            let publisher = EventBridgePublisher::new(&load_sdk_config(None).await);
            forward_logs(&event, &publisher).await
        },
    };

    Ok(response)
}

fn pipeline_names() -> Option<PipelineNames> {
    let names = PipelineNames::from_env();
    if names.is_none() {
        error!("{}", MISSING_PIPELINE_VARS);
    }
    names
}

fn read_event(path: &Path) -> Result<serde_json::Value> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path.display()))?
    };

    serde_json::from_str(&raw).context("Event is not valid JSON")
}
