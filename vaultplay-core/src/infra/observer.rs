use tracing::warn;
use vaultplay_contracts::{PersistenceObserver, PersistenceOp, StorageError};

/// Default observer: persistence failures become `warn` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPersistenceObserver;

impl PersistenceObserver for TracingPersistenceObserver {
    fn persistence_failed(&self, op: PersistenceOp, key: &str, error: &StorageError) {
        warn!(target: "vaultplay::persistence", %op, key, %error, "persistence failed; continuing with in-memory state");
    }
}
