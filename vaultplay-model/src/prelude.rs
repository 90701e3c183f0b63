//! Snapshot of the types surface for engine hosts and presentation layers.
//! Prefer importing from this module instead of individual tree nodes.

pub use super::content::{ContentDescriptor, ContentRef};
pub use super::entitlement::{EntitlementRecord, SubscriptionDetails};
pub use super::error::ModelError;
pub use super::plan::{Plan, PlanCatalog, PlanId, PlanScope, PurchaseReceipt};
pub use super::playback::{
    GateDecision, GateView, MediaEvent, PlaybackSnapshot, PlaybackState,
};
pub use super::progress::{ProgressRecord, format_timestamp};
