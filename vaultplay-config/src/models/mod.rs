pub mod policy;

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::PathBuf, sync::Arc};
use tracing::warn;
use vaultplay_contracts::DurableStorage;
use vaultplay_core::{
    GatePolicy,
    infra::storage::{DiskStorage, MemoryStorage},
};
use vaultplay_model::{PlanCatalog, PlanId};

use crate::loader::error::ConfigLoadError;
use policy::PolicySettings;

/// Default location of the on-disk client store.
pub const DEFAULT_STORAGE_ROOT: &str = "./vaultplay-data";

/// Source that produced the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    /// Path handed to the loader directly (`--config`).
    Explicit(PathBuf),
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-lifetime only; nothing survives a restart.
    Memory,
    #[default]
    Disk,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: PathBuf::from(DEFAULT_STORAGE_ROOT),
        }
    }
}

impl StorageConfig {
    /// Open the configured backend.
    pub fn open(&self) -> Result<Arc<dyn DurableStorage>, ConfigLoadError> {
        match self.backend {
            StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
            StorageBackend::Disk => Ok(Arc::new(DiskStorage::open(&self.root)?)),
        }
    }
}

/// On-disk shape of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub storage: StorageConfig,
    pub policy: PolicySettings,
    pub plans: Option<PlanCatalog>,
    pub merch_claim_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigMetadata {
    pub source: ConfigSource,
    pub env_file_loaded: bool,
    /// Environment variables that overrode file values.
    pub overrides: Vec<&'static str>,
}

/// Resolved, validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub storage: StorageConfig,
    pub policy: GatePolicy,
    pub plans: PlanCatalog,
    pub merch_claim_code: Option<String>,
    pub metadata: ConfigMetadata,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            policy: GatePolicy::default(),
            plans: PlanCatalog::default(),
            merch_claim_code: None,
            metadata: ConfigMetadata::default(),
        }
    }
}

impl Config {
    pub fn from_file(
        file: ConfigFile,
        metadata: ConfigMetadata,
    ) -> Result<Self, ConfigLoadError> {
        Ok(Self {
            storage: file.storage,
            policy: file.policy.resolve()?,
            plans: file.plans.unwrap_or_default(),
            merch_claim_code: file
                .merch_claim_code
                .filter(|code| !code.trim().is_empty()),
            metadata,
        })
    }

    /// Check policy bounds and the plan catalog.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        self.policy.validate().map_err(ConfigLoadError::Invalid)?;

        if self.plans.is_empty() {
            return Err(ConfigLoadError::Invalid(
                "at least one plan must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        for plan in self.plans.plans() {
            // Ids deserialise without the constructor's checks.
            PlanId::new(plan.id.as_str())?;
            if !seen.insert(plan.id.as_str()) {
                return Err(ConfigLoadError::Invalid(format!(
                    "duplicate plan id '{}'",
                    plan.id
                )));
            }
            if plan.merch_claim && self.merch_claim_code.is_none() {
                warn!(
                    plan = %plan.id,
                    "plan offers a merch claim but no merch_claim_code is configured"
                );
            }
        }
        Ok(())
    }
}
