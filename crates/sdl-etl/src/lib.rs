//! SDL ETL operations
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Small operational entry points around the pipeline platform:
//!
//! - [`trigger`]: start the Glue job, start the crawler, or crawl then run
//! - [`transform`]: copy landing objects to the processed bucket, uppercased
//! - [`forwarder`]: republish log records onto the event bus
//!
//! Every operation returns an [`InvocationResponse`](sdl_common::InvocationResponse)
//! and talks to the platform through a trait ([`engine::EtlEngine`],
//! [`sdl_common::storage::ObjectStore`], [`forwarder::EventPublisher`]).

pub mod config;
pub mod engine;
pub mod error;
pub mod forwarder;
pub mod transform;
pub mod trigger;

pub use config::{PipelineNames, TaskConfig};
pub use engine::{CrawlerState, EtlEngine, GlueEngine};
pub use error::{EtlError, Result};
pub use forwarder::{forward_logs, BusEvent, EventBridgePublisher, EventPublisher};
pub use transform::process_landing;
pub use trigger::{crawl_then_run, start_crawler, start_job, WaitPolicy};
