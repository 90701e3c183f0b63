pub mod access;
pub mod entitlement;
pub mod progress;
pub mod simulate;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use vaultplay_config::Config;
use vaultplay_contracts::DurableStorage;
use vaultplay_core::{
    entitlement::EntitlementStore, infra::TracingPersistenceObserver,
    progress::ProgressStore,
};
use vaultplay_model::ContentRef;

/// Resolved configuration plus the opened store.
pub struct Context {
    pub config: Config,
    pub storage: Arc<dyn DurableStorage>,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        let storage = config.storage.open().with_context(|| {
            format!("failed to open store at {}", config.storage.root.display())
        })?;
        Ok(Self { config, storage })
    }

    pub fn entitlements(&self) -> EntitlementStore {
        EntitlementStore::open(
            self.storage.clone(),
            Arc::new(TracingPersistenceObserver),
        )
    }

    pub fn progress(&self) -> ProgressStore {
        ProgressStore::new(self.storage.clone(), Arc::new(TracingPersistenceObserver))
            .with_completion_threshold(self.config.policy.completion_threshold)
    }
}

pub fn content_ref(series: &str, episode: &str) -> Result<ContentRef> {
    ContentRef::new(series, episode)
        .with_context(|| format!("invalid title '{series}' / '{episode}'"))
}
