use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use vaultplay_model::{PlanId, PlanScope, SubscriptionDetails};

use super::{Context, content_ref};

pub fn show(ctx: &Context) -> Result<()> {
    let record = ctx.entitlements().snapshot();
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn grant(ctx: &Context, plan: &str, proof: &str) -> Result<()> {
    let plan_id = PlanId::new(plan)?;
    let plan = ctx
        .config
        .plans
        .get(&plan_id)
        .ok_or_else(|| anyhow!("unknown plan '{plan_id}'"))?;
    if plan.scope == PlanScope::SingleTitle {
        bail!(
            "plan '{}' unlocks a single title; use `entitlement unlock`",
            plan.id
        );
    }

    let changed =
        ctx.entitlements().grant_subscription_with(SubscriptionDetails {
            plan_id: plan.id.clone(),
            proof: proof.to_string(),
            activated_at: Utc::now().timestamp(),
        });
    if changed {
        println!("subscription active ({})", plan.name);
    } else {
        println!("subscription already active ({})", plan.name);
    }
    Ok(())
}

pub fn unlock(ctx: &Context, series: &str, episode: &str) -> Result<()> {
    let content = content_ref(series, episode)?;
    if ctx.entitlements().unlock_content(&content) {
        println!("unlocked {content}");
    } else {
        println!("{content} was already unlocked");
    }
    Ok(())
}
