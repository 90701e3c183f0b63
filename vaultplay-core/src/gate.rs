//! Single authority for access decisions.
//!
//! Both the playback machine and any presentation surface (badges, "preview"
//! labels) call [`decide`], so the gating rule lives in one place.

use std::time::Duration;
use vaultplay_model::{ContentDescriptor, EntitlementRecord, GateDecision};

/// Decide whether `content` may play given the entitlement record and the
/// preview time already consumed in the current window.
///
/// Non-premium and entitled content is always [`GateDecision::Allowed`].
/// Otherwise playback is a preview until `elapsed` reaches `limit`.
pub fn decide(
    content: &ContentDescriptor,
    record: &EntitlementRecord,
    elapsed: Duration,
    limit: Duration,
) -> GateDecision {
    if !content.is_premium || record.is_entitled(&content.content_ref) {
        GateDecision::Allowed
    } else if elapsed < limit {
        GateDecision::PreviewAllowed
    } else {
        GateDecision::Blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultplay_model::ContentRef;

    const LIMIT: Duration = Duration::from_secs(30);

    fn premium(episode: &str) -> ContentDescriptor {
        ContentDescriptor::new(ContentRef::new("series", episode).unwrap(), true)
    }

    #[test]
    fn free_content_is_always_allowed() {
        let free = ContentDescriptor::new(
            ContentRef::new("series", "free").unwrap(),
            false,
        );
        let record = EntitlementRecord::new();
        assert_eq!(
            decide(&free, &record, Duration::from_secs(600), LIMIT),
            GateDecision::Allowed
        );
    }

    #[test]
    fn premium_unentitled_previews_then_blocks() {
        let content = premium("e1");
        let record = EntitlementRecord::new();
        assert_eq!(
            decide(&content, &record, Duration::ZERO, LIMIT),
            GateDecision::PreviewAllowed
        );
        assert_eq!(
            decide(&content, &record, Duration::from_secs(29), LIMIT),
            GateDecision::PreviewAllowed
        );
        assert_eq!(
            decide(&content, &record, LIMIT, LIMIT),
            GateDecision::Blocked
        );
    }

    #[test]
    fn unlock_and_subscription_allow_premium() {
        let a = premium("a");
        let b = premium("b");
        let mut record = EntitlementRecord::new();
        record.unlocked_content.insert(a.content_ref.clone());

        assert_eq!(
            decide(&a, &record, LIMIT, LIMIT),
            GateDecision::Allowed
        );
        assert_eq!(decide(&b, &record, LIMIT, LIMIT), GateDecision::Blocked);

        record.has_active_subscription = true;
        assert_eq!(
            decide(&b, &record, LIMIT, LIMIT),
            GateDecision::Allowed
        );
    }
}
