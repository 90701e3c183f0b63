//! Client-held entitlement state.

use crate::content::ContentRef;
use crate::plan::PlanId;
use std::collections::BTreeSet;

/// Details recorded alongside an active subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SubscriptionDetails {
    pub plan_id: PlanId,
    /// Opaque proof handed back by the billing collaborator (an email
    /// address in the demo checkout).
    pub proof: String,
    /// Unix timestamp of activation
    pub activated_at: i64,
}

/// Entitlement truth for one client installation.
///
/// When `has_active_subscription` is set every content ref is unlocked,
/// regardless of `unlocked_content` membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EntitlementRecord {
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_active_subscription: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub unlocked_content: BTreeSet<ContentRef>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub subscription: Option<SubscriptionDetails>,
}

impl EntitlementRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_entitled(&self, content: &ContentRef) -> bool {
        self.has_active_subscription || self.unlocked_content.contains(content)
    }

    pub fn is_empty(&self) -> bool {
        !self.has_active_subscription && self.unlocked_content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(series: &str, episode: &str) -> ContentRef {
        ContentRef::new(series, episode).unwrap()
    }

    #[test]
    fn unlock_is_per_content_until_subscribed() {
        let a = content("s", "a");
        let b = content("s", "b");
        let mut record = EntitlementRecord::new();
        record.unlocked_content.insert(a.clone());

        assert!(record.is_entitled(&a));
        assert!(!record.is_entitled(&b));

        record.has_active_subscription = true;
        assert!(record.is_entitled(&b));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn persisted_layout_uses_camel_case_keys() {
        let mut record = EntitlementRecord::new();
        record.unlocked_content.insert(content("s1", "e2"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["hasActiveSubscription"], false);
        assert_eq!(json["unlockedContent"][0], "s1:e2");
        assert!(json.get("subscription").is_none());

        let empty: EntitlementRecord = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
