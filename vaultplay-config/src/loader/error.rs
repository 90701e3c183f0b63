use std::path::PathBuf;
use thiserror::Error;
use vaultplay_contracts::StorageError;
use vaultplay_model::ModelError;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {origin}: {reason}")]
    Parse { origin: String, reason: String },
    #[error("invalid duration '{value}' for {field}")]
    Duration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("failed to open storage: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
