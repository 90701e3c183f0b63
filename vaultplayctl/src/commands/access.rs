use std::time::Duration;

use anyhow::Result;
use vaultplay_core::gate;
use vaultplay_model::{ContentDescriptor, GateDecision};

use super::{Context, content_ref};

pub fn label(decision: GateDecision) -> &'static str {
    match decision {
        GateDecision::Allowed => "allowed",
        GateDecision::PreviewAllowed => "preview",
        GateDecision::Blocked => "blocked",
    }
}

pub fn run(
    ctx: &Context,
    series: &str,
    episode: &str,
    premium: bool,
    elapsed: Duration,
) -> Result<()> {
    let descriptor = ContentDescriptor::new(content_ref(series, episode)?, premium);
    let record = ctx.entitlements().snapshot();
    let decision = gate::decide(
        &descriptor,
        &record,
        elapsed,
        ctx.config.policy.preview_limit,
    );
    println!("{}", label(decision));
    Ok(())
}
