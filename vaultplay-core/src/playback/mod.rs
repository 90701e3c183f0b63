//! Playback gating: preview timer, schedulers, the gate overlay, the
//! playback state machine and its async session driver.

pub mod machine;
pub mod overlay;
pub mod scheduler;
pub mod session;
pub mod timer;

pub use machine::PlaybackMachine;
pub use overlay::GatingOverlay;
pub use scheduler::{
    ManualPreviewScheduler, PreviewScheduler, TokioPreviewScheduler,
};
pub use session::{PlaybackSession, SessionCommand, SessionHandle};
pub use timer::{PreviewExpired, PreviewTicket, PreviewTimer};
