//! Purchase plans offered by the gate overlay.

use crate::error::{ModelError, Result};
use std::fmt;

/// Stable plan identifier (`access`, `inner-circle`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PlanId(String);

impl PlanId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ModelError::InvalidPlanId("plan id is empty".into()));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(ModelError::InvalidPlanId(format!(
                "'{raw}' contains whitespace"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a successful purchase of a plan grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlanScope {
    /// Global subscription: every title unlocked.
    Subscription,
    /// Only the title the overlay was presented for.
    SingleTitle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub scope: PlanScope,
    /// Purchase is followed by the merch claim step.
    #[cfg_attr(feature = "serde", serde(default))]
    pub merch_claim: bool,
}

/// Ordered set of plans shown on the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PlanCatalog(Vec<Plan>);

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self(plans)
    }

    pub fn get(&self, id: &PlanId) -> Option<&Plan> {
        self.0.iter().find(|plan| &plan.id == id)
    }

    pub fn plans(&self) -> &[Plan] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        let plan = |id: &str, name: &str, scope, merch_claim| Plan {
            id: PlanId(id.to_string()),
            name: name.to_string(),
            scope,
            merch_claim,
        };
        Self(vec![
            plan("access", "Access", PlanScope::Subscription, false),
            plan("inner-circle", "Inner Circle", PlanScope::Subscription, true),
            plan("single-title", "Single Title", PlanScope::SingleTitle, false),
        ])
    }
}

/// Success callback payload from the billing collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PurchaseReceipt {
    pub plan_id: PlanId,
    pub proof: String,
}

impl PurchaseReceipt {
    pub fn new(plan_id: PlanId, proof: impl Into<String>) -> Self {
        Self {
            plan_id,
            proof: proof.into(),
        }
    }
}
