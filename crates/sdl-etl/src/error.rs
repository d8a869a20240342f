//! Error types for ETL operations

use sdl_common::SdlError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    /// Glue API call failed
    #[error("{0}")]
    Engine(String),

    #[error("Crawler {crawler} not ready after {attempts} checks")]
    CrawlerTimeout { crawler: String, attempts: u32 },

    #[error("Failed to publish event: {0}")]
    Publish(String),

    #[error("Object {key} is not valid UTF-8")]
    NotUtf8 { key: String },

    #[error(transparent)]
    Storage(#[from] SdlError),
}

impl EtlError {
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }
}
