//! Entitlement store
//!
//! Local cache of entitlement truth for one client installation: the global
//! subscription flag plus per-content unlocks. Constructed once at start-up
//! and shared (`Arc`) between the playback machine and the gate overlay.
//!
//! ## Persistence
//!
//! Every effective mutation is written to [`DurableStorage`] under
//! [`ENTITLEMENT_KEY`] before the call returns. A failed write is reported to
//! the [`PersistenceObserver`] and the in-memory record keeps the grant for
//! the rest of the session.
//!
//! ## Change notification
//!
//! [`EntitlementStore::subscribe`] hands out a `watch` receiver whose
//! revision counter bumps on every effective mutation. The playback session
//! uses it to pick up grants made by other components.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};
use vaultplay_contracts::{
    DurableStorage, PersistenceObserver, PersistenceOp, StorageError,
};
use vaultplay_model::{ContentRef, EntitlementRecord, SubscriptionDetails};

/// Storage key of the entitlement record.
pub const ENTITLEMENT_KEY: &str = "entitlement";

#[derive(Debug)]
pub struct EntitlementStore {
    record: RwLock<EntitlementRecord>,
    storage: Arc<dyn DurableStorage>,
    observer: Arc<dyn PersistenceObserver>,
    revision: watch::Sender<u64>,
}

impl EntitlementStore {
    /// Load the persisted record, falling back to an empty one when it is
    /// missing or unreadable.
    pub fn open(
        storage: Arc<dyn DurableStorage>,
        observer: Arc<dyn PersistenceObserver>,
    ) -> Self {
        let record = match storage.get(ENTITLEMENT_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<EntitlementRecord>(&raw) {
                Ok(record) => record,
                Err(err) => {
                    observer.persistence_failed(
                        PersistenceOp::LoadEntitlement,
                        ENTITLEMENT_KEY,
                        &StorageError::Corrupt {
                            key: ENTITLEMENT_KEY.to_string(),
                            reason: err.to_string(),
                        },
                    );
                    EntitlementRecord::default()
                }
            },
            Ok(None) => EntitlementRecord::default(),
            Err(err) => {
                observer.persistence_failed(
                    PersistenceOp::LoadEntitlement,
                    ENTITLEMENT_KEY,
                    &err,
                );
                EntitlementRecord::default()
            }
        };

        debug!(
            target: "vaultplay::entitlement",
            subscribed = record.has_active_subscription,
            unlocked = record.unlocked_content.len(),
            "entitlement record loaded"
        );

        let (revision, _) = watch::channel(0);
        Self {
            record: RwLock::new(record),
            storage,
            observer,
            revision,
        }
    }

    /// `true` iff subscribed or `content` was explicitly unlocked.
    pub fn is_entitled(&self, content: &ContentRef) -> bool {
        self.record.read().is_entitled(content)
    }

    pub fn has_active_subscription(&self) -> bool {
        self.record.read().has_active_subscription
    }

    pub fn snapshot(&self) -> EntitlementRecord {
        self.record.read().clone()
    }

    /// Activate the global subscription. Idempotent; returns whether the
    /// record changed.
    pub fn grant_subscription(&self) -> bool {
        self.mutate(|record| {
            if record.has_active_subscription {
                return false;
            }
            record.has_active_subscription = true;
            true
        })
    }

    /// Activate the subscription and record the plan it came from.
    ///
    /// Re-granting with identical details is a no-op; a different plan
    /// replaces the stored details.
    pub fn grant_subscription_with(&self, details: SubscriptionDetails) -> bool {
        self.mutate(|record| {
            if record.has_active_subscription
                && record.subscription.as_ref() == Some(&details)
            {
                return false;
            }
            record.has_active_subscription = true;
            record.subscription = Some(details);
            true
        })
    }

    /// Unlock a single title, independent of subscription state. Idempotent.
    pub fn unlock_content(&self, content: &ContentRef) -> bool {
        self.mutate(|record| record.unlocked_content.insert(content.clone()))
    }

    /// Receiver whose value bumps on every effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn mutate(&self, apply: impl FnOnce(&mut EntitlementRecord) -> bool) -> bool {
        let mut record = self.record.write();
        if !apply(&mut record) {
            return false;
        }

        // Written under the lock so concurrent grants reach storage in order.
        let result = serde_json::to_string(&*record)
            .map_err(|err| StorageError::Corrupt {
                key: ENTITLEMENT_KEY.to_string(),
                reason: err.to_string(),
            })
            .and_then(|json| self.storage.set(ENTITLEMENT_KEY, &json));
        if let Err(err) = result {
            self.observer.persistence_failed(
                PersistenceOp::SaveEntitlement,
                ENTITLEMENT_KEY,
                &err,
            );
        }

        info!(
            target: "vaultplay::entitlement",
            subscribed = record.has_active_subscription,
            unlocked = record.unlocked_content.len(),
            "entitlement updated"
        );
        drop(record);

        self.revision.send_modify(|revision| *revision += 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::MemoryStorage;
    use crate::infra::testing::{FlakyStorage, RecordingObserver};

    fn content(episode: &str) -> ContentRef {
        ContentRef::new("series", episode).unwrap()
    }

    #[test]
    fn grant_subscription_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let store =
            EntitlementStore::open(storage.clone(), Arc::new(RecordingObserver::new()));

        assert!(store.grant_subscription());
        let revision = store.revision();
        assert!(!store.grant_subscription());

        assert_eq!(store.revision(), revision);
        assert!(store.is_entitled(&content("any")));
    }

    #[test]
    fn grants_are_persisted_before_returning() {
        let storage = Arc::new(MemoryStorage::new());
        let observer = Arc::new(RecordingObserver::new());
        let store = EntitlementStore::open(storage.clone(), observer.clone());
        store.unlock_content(&content("a"));

        let reopened = EntitlementStore::open(storage.clone(), observer);
        assert!(reopened.is_entitled(&content("a")));
        assert!(!reopened.is_entitled(&content("b")));

        let raw = storage.get(ENTITLEMENT_KEY).unwrap().unwrap();
        assert!(raw.contains("\"unlockedContent\":[\"series:a\"]"));
    }

    #[test]
    fn write_failure_keeps_session_grant_and_reports() {
        let storage = Arc::new(FlakyStorage::new());
        storage.set_fail_writes(true);
        let observer = Arc::new(RecordingObserver::new());
        let store = EntitlementStore::open(storage.clone(), observer.clone());

        assert!(store.grant_subscription());
        assert!(store.is_entitled(&content("x")));
        assert_eq!(
            observer.failures(),
            vec![(PersistenceOp::SaveEntitlement, ENTITLEMENT_KEY.to_string())]
        );
        assert_eq!(storage.get(ENTITLEMENT_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_record_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ENTITLEMENT_KEY, "{not json").unwrap();
        let observer = Arc::new(RecordingObserver::new());

        let store = EntitlementStore::open(storage, observer.clone());
        assert!(store.snapshot().is_empty());
        assert_eq!(observer.failures()[0].0, PersistenceOp::LoadEntitlement);
    }

    #[test]
    fn subscribers_see_revision_bumps() {
        let store = EntitlementStore::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(RecordingObserver::new()),
        );
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.unlock_content(&content("a"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);

        store.unlock_content(&content("a"));
        assert!(!rx.has_changed().unwrap());
    }
}
