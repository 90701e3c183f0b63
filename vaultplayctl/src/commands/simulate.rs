//! Headless playback on a virtual clock.
//!
//! Drives a real [`PlaybackMachine`] with a manual scheduler and a recording
//! media primitive, advancing one second per step and reporting a time
//! update each second like a media element would.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use vaultplay_contracts::DurableStorage;
use vaultplay_core::{
    entitlement::{ENTITLEMENT_KEY, EntitlementStore},
    infra::{
        TimeProvider, TracingPersistenceObserver, VirtualTimeProvider,
        storage::MemoryStorage,
        testing::{RecordingMedia, RecordingSurface},
    },
    playback::{GatingOverlay, ManualPreviewScheduler, PlaybackMachine},
    progress::{ProgressStore, progress_key},
};
use vaultplay_model::{
    ContentDescriptor, ContentRef, GateView, PlanId, PlaybackState,
    PurchaseReceipt, format_timestamp,
};

use super::{Context, access::label, content_ref};

const STEP: Duration = Duration::from_secs(1);

pub struct SimulateOptions {
    pub series: String,
    pub episode: String,
    pub premium: bool,
    pub duration: f64,
    pub watch: Duration,
    pub buy: Option<String>,
    pub persist: bool,
}

struct Reporter {
    state: PlaybackState,
    gate: GateView,
}

impl Reporter {
    fn observe(&mut self, at: Duration, machine: &PlaybackMachine) {
        let snapshot = machine.snapshot();
        if snapshot.state != self.state {
            println!(
                "[{}] {} -> {} at {}",
                format_timestamp(at.as_secs_f64()),
                self.state,
                snapshot.state,
                format_timestamp(snapshot.position_seconds)
            );
            self.state = snapshot.state;
        }
        if snapshot.gate != self.gate {
            println!(
                "[{}] gate: {}",
                format_timestamp(at.as_secs_f64()),
                describe(&snapshot.gate)
            );
            self.gate = snapshot.gate;
        }
    }
}

fn describe(view: &GateView) -> String {
    match view {
        GateView::Hidden => "hidden".to_string(),
        GateView::PlanSelection { plans, .. } => {
            let ids: Vec<&str> = plans.iter().map(|plan| plan.id.as_str()).collect();
            format!("choose a plan ({})", ids.join(", "))
        }
        GateView::Checkout { plan, .. } => format!("checkout ({})", plan.name),
        GateView::MerchClaim { code } => format!("merch claim code {code}"),
    }
}

/// Copy the records the simulation reads into a scratch store.
fn scratch_store(ctx: &Context, content: &ContentRef) -> Result<Arc<dyn DurableStorage>> {
    let scratch = MemoryStorage::new();
    for key in [ENTITLEMENT_KEY.to_string(), progress_key(content)] {
        if let Some(value) = ctx.storage.get(&key)? {
            scratch.set(&key, &value)?;
        }
    }
    Ok(Arc::new(scratch))
}

pub fn run(ctx: &Context, opts: SimulateOptions) -> Result<()> {
    let content = content_ref(&opts.series, &opts.episode)?;
    let policy = ctx.config.policy;
    let storage = if opts.persist {
        ctx.storage.clone()
    } else {
        scratch_store(ctx, &content)?
    };

    let clock = VirtualTimeProvider::new();
    let clock_arc: Arc<dyn TimeProvider> = Arc::new(clock.clone());
    let scheduler = ManualPreviewScheduler::new();
    let observer = Arc::new(TracingPersistenceObserver);
    let entitlements = Arc::new(EntitlementStore::open(storage.clone(), observer.clone()));
    let progress = ProgressStore::new(storage, observer)
        .with_completion_threshold(policy.completion_threshold);

    let mut overlay = GatingOverlay::new(
        ctx.config.plans.clone(),
        entitlements.clone(),
        Box::new(RecordingSurface::new()),
        clock_arc.clone(),
    );
    if let Some(code) = &ctx.config.merch_claim_code {
        overlay = overlay.with_merch_claim_code(code.clone());
    }
    let mut machine = PlaybackMachine::new(
        policy,
        entitlements,
        progress,
        Arc::new(scheduler.clone()),
        Box::new(RecordingMedia::new()),
        overlay,
        clock_arc,
    );

    let descriptor =
        ContentDescriptor::new(content, opts.premium).with_duration(opts.duration);
    if let Some(offset) = machine.open(descriptor) {
        println!("[0:00] resuming at {}", format_timestamp(offset));
    }

    let mut reporter = Reporter {
        state: machine.state(),
        gate: GateView::Hidden,
    };
    let decision = machine.play()?;
    println!("[0:00] play: {}", label(decision));
    reporter.observe(Duration::ZERO, &machine);

    let mut watched = Duration::ZERO;
    let mut purchased = false;
    while watched < opts.watch {
        clock.advance(STEP);
        watched += STEP;
        for ticket in scheduler.take_due(clock.now()) {
            machine.on_preview_timer_fired(ticket);
        }

        if machine.state() == PlaybackState::Playing {
            let position = (machine.position() + STEP.as_secs_f64()).min(opts.duration);
            machine.on_time_update(position);
            if position >= opts.duration {
                machine.pause()?;
                reporter.observe(watched, &machine);
                println!("[{}] reached the end", format_timestamp(watched.as_secs_f64()));
                break;
            }
        }
        reporter.observe(watched, &machine);

        if machine.state() != PlaybackState::GatedPreviewExpired {
            continue;
        }
        match &opts.buy {
            Some(plan) if !purchased => {
                purchased = true;
                let receipt = PurchaseReceipt::new(PlanId::new(plan.as_str())?, "simulated");
                let plan = machine.on_purchase_succeeded(&receipt)?;
                println!(
                    "[{}] purchased {}",
                    format_timestamp(watched.as_secs_f64()),
                    plan.name
                );
                reporter.observe(watched, &machine);
                let decision = machine.play()?;
                println!(
                    "[{}] play: {}",
                    format_timestamp(watched.as_secs_f64()),
                    label(decision)
                );
                reporter.observe(watched, &machine);
            }
            _ => break,
        }
    }

    let snapshot = machine.snapshot();
    println!(
        "final: {} at {} / {}{}",
        snapshot.state,
        format_timestamp(snapshot.position_seconds),
        format_timestamp(snapshot.duration_seconds),
        snapshot
            .preview_remaining
            .map(|left| format!(", preview left {}", format_timestamp(left.as_secs_f64())))
            .unwrap_or_default()
    );
    Ok(())
}
