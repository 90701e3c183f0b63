use thiserror::Error;
use vaultplay_model::{ModelError, PlanId, PlaybackState};

use vaultplay_contracts::StorageError;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid transition: cannot {action} while {state}")]
    InvalidTransition {
        state: PlaybackState,
        action: &'static str,
    },

    #[error("preview timer already running")]
    TimerAlreadyRunning,

    #[error("no content loaded")]
    NoContent,

    #[error("unknown plan: {0}")]
    UnknownPlan(PlanId),

    #[error("playback session closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, GateError>;
