//! Playback states, media events and the views they produce.

use crate::content::ContentRef;
use crate::plan::Plan;
use std::{fmt, time::Duration};

/// States of the playback state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    /// Preview window elapsed; play is refused until entitlement changes.
    GatedPreviewExpired,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::GatedPreviewExpired => "gated",
        };
        f.write_str(label)
    }
}

/// Access decision for a content instance at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GateDecision {
    Allowed,
    PreviewAllowed,
    Blocked,
}

/// Events reported by the media-playback primitive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum MediaEvent {
    TimeUpdate { offset_seconds: f64 },
    DurationKnown { duration_seconds: f64 },
    Played,
    Paused,
    Failed { message: String },
}

/// Stage of the gate overlay, as handed to the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateView {
    #[default]
    Hidden,
    PlanSelection {
        content: ContentRef,
        plans: Vec<Plan>,
    },
    Checkout {
        content: ContentRef,
        plan: Plan,
    },
    MerchClaim {
        code: String,
    },
}

impl GateView {
    pub fn is_visible(&self) -> bool {
        !matches!(self, GateView::Hidden)
    }
}

/// Point-in-time view of a playback machine for presentation layers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub content: Option<ContentRef>,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    /// Remaining preview allowance while a preview window is running.
    pub preview_remaining: Option<Duration>,
    pub gate: GateView,
}
