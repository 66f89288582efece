// src/error.rs
use std::io;
use thiserror::Error;

/// Result type for collector operations
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Custom Error type for the collector-config library
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metric error: {0}")]
    Metric(String),

    #[error("Collector not found: {0}")]
    NotFound(String),
}
