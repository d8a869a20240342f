//! SDL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the SDL operations tools.
//!
//! # Overview
//!
//! This crate provides common functionality used across all SDL workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//! - **Responses**: The `{statusCode, body}` value every activation returns
//! - **Environment**: Required/optional variable lookup helpers
//! - **Storage**: S3 object store access behind the [`storage::ObjectStore`] trait
//!
//! # Example
//!
//! ```no_run
//! use sdl_common::{env, InvocationResponse, Result};
//!
//! fn handler() -> Result<InvocationResponse> {
//!     let bucket = env::required_var("MONITOR_S3")?;
//!     Ok(InvocationResponse::ok_message(format!("Using bucket {}", bucket)))
//! }
//! ```

pub mod aws;
pub mod env;
pub mod error;
pub mod logging;
pub mod response;
pub mod storage;

// Re-export commonly used types
pub use error::{Result, SdlError};
pub use response::InvocationResponse;
