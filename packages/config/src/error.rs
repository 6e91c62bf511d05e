// ABOUTME: Error types for configuration loading and persistence
// ABOUTME: Covers directory resolution, config.json I/O, and environment parsing

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),

    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}
