//! Resume-position tracking
//!
//! One record per content instance, keyed `progress:{series}:{episode}` and
//! stored as a decimal string. A position is only checkpointed while the
//! content is "in progress": once `offset / duration` reaches the completion
//! threshold (90% by default) saves are withheld, so finished content is
//! never resumed at its credits.

use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::trace;
use vaultplay_contracts::{
    DurableStorage, PersistenceObserver, PersistenceOp, StorageError,
};
use vaultplay_model::{ContentRef, ProgressRecord};

use crate::policy::DEFAULT_COMPLETION_THRESHOLD;

/// Prefix shared by every progress key.
pub const PROGRESS_KEY_PREFIX: &str = "progress:";

pub fn progress_key(content: &ContentRef) -> String {
    format!(
        "{PROGRESS_KEY_PREFIX}{}:{}",
        content.series_id(),
        content.episode_id()
    )
}

/// Result of a [`ProgressStore::save`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    Withheld(WithheldReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithheldReason {
    /// Duration not loaded yet (zero, negative or NaN).
    UnknownDuration,
    /// Negative or non-finite offset.
    InvalidOffset,
    /// At or past the completion threshold.
    Completed,
}

#[derive(Debug)]
pub struct ProgressStore {
    storage: Arc<dyn DurableStorage>,
    observer: Arc<dyn PersistenceObserver>,
    completion_threshold: f64,
    /// Accepted saves for this session, kept even when the durable write
    /// failed.
    session: RwLock<HashMap<ContentRef, (f64, f64)>>,
}

impl ProgressStore {
    pub fn new(
        storage: Arc<dyn DurableStorage>,
        observer: Arc<dyn PersistenceObserver>,
    ) -> Self {
        Self {
            storage,
            observer,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            session: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_completion_threshold(mut self, threshold: f64) -> Self {
        self.completion_threshold = threshold;
        self
    }

    pub fn completion_threshold(&self) -> f64 {
        self.completion_threshold
    }

    /// Last checkpointed offset, `None` if never recorded.
    pub fn load(&self, content: &ContentRef) -> Option<f64> {
        if let Some((offset, _)) = self.session.read().get(content) {
            return Some(*offset);
        }

        let key = progress_key(content);
        match self.storage.get(&key) {
            Ok(Some(raw)) => match parse_offset(&raw) {
                Some(offset) => Some(offset),
                None => {
                    self.observer.persistence_failed(
                        PersistenceOp::LoadProgress,
                        &key,
                        &StorageError::Corrupt {
                            key: key.clone(),
                            reason: format!("'{raw}' is not a valid offset"),
                        },
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                self.observer
                    .persistence_failed(PersistenceOp::LoadProgress, &key, &err);
                None
            }
        }
    }

    /// Checkpoint `offset` if the content is still in progress.
    pub fn save(
        &self,
        content: &ContentRef,
        offset_seconds: f64,
        duration_seconds: f64,
    ) -> SaveOutcome {
        if let Some(reason) =
            self.withhold_reason(offset_seconds, duration_seconds)
        {
            trace!(
                target: "vaultplay::progress",
                %content,
                offset_seconds,
                duration_seconds,
                ?reason,
                "progress save withheld"
            );
            return SaveOutcome::Withheld(reason);
        }

        self.session
            .write()
            .insert(content.clone(), (offset_seconds, duration_seconds));

        let key = progress_key(content);
        if let Err(err) = self.storage.set(&key, &offset_seconds.to_string()) {
            self.observer
                .persistence_failed(PersistenceOp::SaveProgress, &key, &err);
        }
        SaveOutcome::Written
    }

    /// Forget the resume point for `content`, so the next open starts from
    /// the beginning. Returns whether a record existed.
    pub fn clear(&self, content: &ContentRef) -> bool {
        let cached = self.session.write().remove(content).is_some();
        let key = progress_key(content);
        let stored = match self.storage.get(&key) {
            Ok(value) => value.is_some(),
            Err(err) => {
                self.observer
                    .persistence_failed(PersistenceOp::ClearProgress, &key, &err);
                false
            }
        };
        if stored && let Err(err) = self.storage.remove(&key) {
            self.observer
                .persistence_failed(PersistenceOp::ClearProgress, &key, &err);
        }

        trace!(target: "vaultplay::progress", %content, "progress cleared");
        cached || stored
    }

    /// Every known progress record, sorted by content ref.
    pub fn entries(&self) -> Vec<ProgressRecord> {
        let mut records: HashMap<ContentRef, ProgressRecord> = HashMap::new();

        match self.storage.keys_with_prefix(PROGRESS_KEY_PREFIX) {
            Ok(keys) => {
                for key in keys {
                    let Some(content) = key
                        .strip_prefix(PROGRESS_KEY_PREFIX)
                        .and_then(|rest| rest.parse::<ContentRef>().ok())
                    else {
                        continue;
                    };
                    if let Some(offset) = self.load(&content) {
                        records.insert(
                            content.clone(),
                            ProgressRecord {
                                content_ref: content,
                                offset_seconds: offset,
                                duration_seconds: 0.0,
                            },
                        );
                    }
                }
            }
            Err(err) => self.observer.persistence_failed(
                PersistenceOp::LoadProgress,
                PROGRESS_KEY_PREFIX,
                &err,
            ),
        }

        for (content, (offset, duration)) in self.session.read().iter() {
            records.insert(
                content.clone(),
                ProgressRecord {
                    content_ref: content.clone(),
                    offset_seconds: *offset,
                    duration_seconds: *duration,
                },
            );
        }

        let mut out: Vec<_> = records.into_values().collect();
        out.sort_by(|a, b| a.content_ref.cmp(&b.content_ref));
        out
    }

    fn withhold_reason(&self, offset: f64, duration: f64) -> Option<WithheldReason> {
        if !(duration.is_finite() && duration > 0.0) {
            Some(WithheldReason::UnknownDuration)
        } else if !(offset.is_finite() && offset >= 0.0) {
            Some(WithheldReason::InvalidOffset)
        } else if offset / duration >= self.completion_threshold {
            Some(WithheldReason::Completed)
        } else {
            None
        }
    }
}

fn parse_offset(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|offset| offset.is_finite() && *offset >= 0.0)
}
