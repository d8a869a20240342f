//! SDL Monitor - pipeline state-change notifier

use anyhow::{Context, Result};
use clap::Parser;
use sdl_common::aws::load_sdk_config;
use sdl_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use sdl_common::storage::Storage;
use sdl_monitor::audit::{AuditKeyspace, ObjectStoreAuditWriter};
use sdl_monitor::chat::WebhookChatSender;
use sdl_monitor::{BatchProcessor, Dispatcher, MonitorConfig};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "sdl-monitor")]
#[command(author, version, about = "Notify and audit pipeline state changes")]
struct Cli {
    /// Batch JSON to process ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    event: PathBuf,

    /// Identifier of this activation, used to disambiguate audit keys.
    /// Must be unique per run; a fresh UUID is used when omitted.
    #[arg(long)]
    invocation_id: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
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
        .log_file_prefix("sdl-monitor")
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

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "sdl-monitor failed to start");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = MonitorConfig::load().context("Invalid monitor configuration")?;
    let event = read_event(&cli.event)?;
    let invocation_id = cli
        .invocation_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let sdk_config = load_sdk_config(config.region.as_deref()).await;
    let store = Storage::new(config.audit.clone(), &sdk_config);

    let chat = WebhookChatSender::new(config.webhook_url.clone(), config.webhook_timeout())
        .context("Failed to build webhook client")?;

    let dispatcher = Dispatcher::new(
        Arc::new(chat),
        Arc::new(ObjectStoreAuditWriter::new(Arc::new(store))),
        AuditKeyspace::new(config.audit_database.clone(), config.audit_table.clone()),
    );
    let processor = BatchProcessor::new(dispatcher);

    info!(invocation_id = %invocation_id, "Processing batch");
    let response = processor.handle(&event, &invocation_id).await;

    println!(
        "{}",
        serde_json::to_string(&response).context("Failed to encode response")?
    );

    Ok(())
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

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serial_test::serial;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    #[serial]
    fn test_invocation_id_is_not_read_from_environment() {
        std::env::set_var("SDL_INVOCATION_ID", "static-id");
        let cli = Cli::try_parse_from(["sdl-monitor"]).unwrap();
        std::env::remove_var("SDL_INVOCATION_ID");

        assert_eq!(cli.invocation_id, None);
    }

    #[test]
    fn test_invocation_id_flag() {
        let cli = Cli::try_parse_from(["sdl-monitor", "--invocation-id", "inv-42"]).unwrap();
        assert_eq!(cli.invocation_id.as_deref(), Some("inv-42"));
        assert_eq!(cli.event, PathBuf::from("-"));
    }
}
