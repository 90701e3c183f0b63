//! Configuration for Vaultplay.
//!
//! Resolves storage, gating policy and the plan catalog from a TOML or JSON
//! file, inline JSON or defaults, with a small set of environment overrides.
//! Durations accept `humantime` strings (`"30s"`, `"1m 30s"`).

pub mod loader;
pub mod models;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::policy::{DurationSetting, PolicySettings};
pub use models::{
    Config, ConfigFile, ConfigMetadata, ConfigSource, DEFAULT_STORAGE_ROOT,
    StorageBackend, StorageConfig,
};
