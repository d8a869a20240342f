//! SDL Monitor Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Turns batched pipeline state-change notifications into chat alerts and
//! durable audit records.
//!
//! # Architecture
//!
//! ```text
//! {Records: [{Sns: {Message}}]}
//!         │
//!   BatchProcessor ── unwraps each envelope, never aborts on one bad item
//!         │
//!     classifier ──── RawNotification -> ClassifiedEvent (pure)
//!         │
//!     Dispatcher ──── render -> ChatSender (+ one secondary alert on failure)
//!                           -> AuditWriter (always)
//! ```
//!
//! The chat endpoint and the audit store sit behind the [`chat::ChatSender`]
//! and [`audit::AuditWriter`] traits; `main` wires in the webhook and S3
//! implementations, tests wire in fakes.
//!
//! # Example
//!
//! ```no_run
//! use sdl_monitor::{audit::AuditKeyspace, BatchProcessor, Dispatcher};
//! # use std::sync::Arc;
//! # async fn run(
//! #     chat: Arc<dyn sdl_monitor::chat::ChatSender>,
//! #     audit: Arc<dyn sdl_monitor::audit::AuditWriter>,
//! #     event: serde_json::Value,
//! # ) {
//! let dispatcher = Dispatcher::new(chat, audit, AuditKeyspace::new("ops", "glue_events"));
//! let processor = BatchProcessor::new(dispatcher);
//! let response = processor.handle(&event, "invocation-1").await;
//! println!("{}", response.status_code);
//! # }
//! ```

pub mod audit;
pub mod batch;
pub mod chat;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod render;

// Re-export commonly used types
pub use batch::{BatchProcessor, BatchResult, ItemError, ItemErrorKind};
pub use config::MonitorConfig;
pub use dispatcher::{DispatchContext, DispatchOutcome, Dispatcher};
pub use error::{DeliveryError, PersistenceError, TransportContractError, ValidationError};
pub use event::{ClassifiedEvent, Severity, SubjectKind};
