//! Gate overlay controller.
//!
//! Presents the plan picker once a preview runs out, walks the checkout
//! stage and converts a successful purchase into an entitlement grant. The
//! overlay never touches playback directly; the machine observes the grant
//! through the entitlement store.

use std::sync::Arc;
use tracing::{debug, info};
use vaultplay_contracts::GateSurface;
use vaultplay_model::{
    ContentRef, GateView, Plan, PlanCatalog, PlanId, PlanScope, PurchaseReceipt,
    SubscriptionDetails,
};

use crate::entitlement::EntitlementStore;
use crate::error::{GateError, Result};
use crate::infra::time::TimeProvider;

#[derive(Debug)]
pub struct GatingOverlay {
    catalog: PlanCatalog,
    entitlements: Arc<EntitlementStore>,
    surface: Box<dyn GateSurface>,
    clock: Arc<dyn TimeProvider>,
    merch_claim_code: Option<String>,
    view: GateView,
    /// Content the overlay was last presented for.
    presented_for: Option<ContentRef>,
}

impl GatingOverlay {
    pub fn new(
        catalog: PlanCatalog,
        entitlements: Arc<EntitlementStore>,
        surface: Box<dyn GateSurface>,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            catalog,
            entitlements,
            surface,
            clock,
            merch_claim_code: None,
            view: GateView::Hidden,
            presented_for: None,
        }
    }

    pub fn with_merch_claim_code(mut self, code: impl Into<String>) -> Self {
        self.merch_claim_code = Some(code.into());
        self
    }

    pub fn view(&self) -> &GateView {
        &self.view
    }

    pub fn is_visible(&self) -> bool {
        self.view.is_visible()
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Show the plan picker for `content`.
    pub fn present(&mut self, content: &ContentRef) {
        self.presented_for = Some(content.clone());
        self.set_view(GateView::PlanSelection {
            content: content.clone(),
            plans: self.catalog.plans().to_vec(),
        });
    }

    /// Move to the checkout stage for `plan_id`.
    pub fn select_plan(&mut self, plan_id: &PlanId) -> Result<()> {
        let content = self.presented_for.clone().ok_or(GateError::NoContent)?;
        let plan = self.lookup(plan_id)?.clone();
        self.set_view(GateView::Checkout { content, plan });
        Ok(())
    }

    /// Back from checkout to the plan picker. No-op in any other stage.
    pub fn back(&mut self) {
        if let GateView::Checkout { content, .. } = &self.view {
            let content = content.clone();
            self.set_view(GateView::PlanSelection {
                content,
                plans: self.catalog.plans().to_vec(),
            });
        }
    }

    pub fn dismiss(&mut self) {
        if self.is_visible() {
            self.set_view(GateView::Hidden);
        }
    }

    /// Hide the overlay and forget the content it was presented for, so a
    /// late single-title receipt cannot unlock a title that is no longer
    /// loaded.
    pub fn reset(&mut self) {
        self.dismiss();
        self.presented_for = None;
    }

    /// Apply a successful purchase. Returns the purchased plan.
    pub fn complete_purchase(&mut self, receipt: &PurchaseReceipt) -> Result<Plan> {
        let plan = self.lookup(&receipt.plan_id)?.clone();

        match plan.scope {
            PlanScope::Subscription => {
                self.entitlements.grant_subscription_with(SubscriptionDetails {
                    plan_id: plan.id.clone(),
                    proof: receipt.proof.clone(),
                    activated_at: self.clock.utc_now().timestamp(),
                });
            }
            PlanScope::SingleTitle => {
                let content =
                    self.presented_for.as_ref().ok_or(GateError::NoContent)?;
                self.entitlements.unlock_content(content);
            }
        }

        info!(
            target: "vaultplay::overlay",
            plan = %plan.id,
            scope = ?plan.scope,
            "purchase applied"
        );

        match (&self.merch_claim_code, plan.merch_claim) {
            (Some(code), true) => {
                let code = code.clone();
                self.set_view(GateView::MerchClaim { code });
            }
            (None, true) => {
                debug!(target: "vaultplay::overlay", plan = %plan.id, "no merch claim code configured");
                self.set_view(GateView::Hidden);
            }
            (_, false) => self.set_view(GateView::Hidden),
        }
        Ok(plan)
    }

    /// Report a playback failure on the same surface.
    pub fn playback_failed(&mut self, message: &str) {
        self.surface.playback_failed(message);
    }

    fn lookup(&self, plan_id: &PlanId) -> Result<&Plan> {
        self.catalog
            .get(plan_id)
            .ok_or_else(|| GateError::UnknownPlan(plan_id.clone()))
    }

    fn set_view(&mut self, view: GateView) {
        debug!(target: "vaultplay::overlay", ?view, "gate view");
        self.surface.show(&view);
        self.view = view;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::MemoryStorage;
    use crate::infra::testing::{RecordingObserver, RecordingSurface};
    use crate::infra::time::VirtualTimeProvider;

    fn overlay() -> (GatingOverlay, Arc<EntitlementStore>, RecordingSurface) {
        let entitlements = Arc::new(EntitlementStore::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(RecordingObserver::new()),
        ));
        let surface = RecordingSurface::new();
        let overlay = GatingOverlay::new(
            PlanCatalog::default(),
            entitlements.clone(),
            Box::new(surface.clone()),
            Arc::new(VirtualTimeProvider::new()),
        )
        .with_merch_claim_code("DROP-2025");
        (overlay, entitlements, surface)
    }

    fn content() -> ContentRef {
        ContentRef::new("series", "e1").unwrap()
    }

    fn plan(id: &str) -> PlanId {
        PlanId::new(id).unwrap()
    }

    #[test]
    fn checkout_navigation() {
        let (mut overlay, _, surface) = overlay();
        overlay.present(&content());
        overlay.select_plan(&plan("access")).unwrap();
        assert!(matches!(overlay.view(), GateView::Checkout { plan, .. } if plan.id.as_str() == "access"));

        overlay.back();
        assert!(matches!(overlay.view(), GateView::PlanSelection { .. }));
        assert_eq!(surface.views().len(), 3);

        overlay.dismiss();
        assert_eq!(surface.current(), GateView::Hidden);
    }

    #[test]
    fn inner_circle_purchase_shows_merch_claim() {
        let (mut overlay, entitlements, surface) = overlay();
        overlay.present(&content());
        overlay
            .complete_purchase(&PurchaseReceipt::new(plan("inner-circle"), "rcpt-1"))
            .unwrap();

        assert!(entitlements.has_active_subscription());
        assert_eq!(
            surface.current(),
            GateView::MerchClaim {
                code: "DROP-2025".into()
            }
        );
        let details = entitlements.snapshot().subscription.unwrap();
        assert_eq!(details.plan_id, plan("inner-circle"));
        assert_eq!(details.proof, "rcpt-1");
    }

    #[test]
    fn single_title_purchase_unlocks_presented_content_only() {
        let (mut overlay, entitlements, _) = overlay();
        overlay.present(&content());
        overlay
            .complete_purchase(&PurchaseReceipt::new(plan("single-title"), "r"))
            .unwrap();

        assert!(entitlements.is_entitled(&content()));
        assert!(!entitlements.has_active_subscription());
        assert!(!overlay.is_visible());
    }

    #[test]
    fn unknown_plan_is_rejected_without_grant() {
        let (mut overlay, entitlements, _) = overlay();
        overlay.present(&content());
        let err = overlay
            .complete_purchase(&PurchaseReceipt::new(plan("lifetime"), "r"))
            .unwrap_err();

        assert!(matches!(err, GateError::UnknownPlan(_)));
        assert!(entitlements.snapshot().is_empty());
        assert!(overlay.is_visible());
    }
}
