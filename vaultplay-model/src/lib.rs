//! Core data model definitions shared across Vaultplay crates.
#![allow(missing_docs)]

pub mod content;
pub mod entitlement;
pub mod error;
pub mod plan;
pub mod playback;
pub mod prelude;
pub mod progress;

// Intentionally curated re-exports for downstream consumers.
pub use content::{CONTENT_REF_SEPARATOR, ContentDescriptor, ContentRef};
pub use entitlement::{EntitlementRecord, SubscriptionDetails};
pub use error::{ModelError, Result as ModelResult};
pub use plan::{Plan, PlanCatalog, PlanId, PlanScope, PurchaseReceipt};
pub use playback::{
    GateDecision, GateView, MediaEvent, PlaybackSnapshot, PlaybackState,
};
pub use progress::{ProgressRecord, format_timestamp};
