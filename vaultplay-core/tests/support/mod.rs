#![allow(dead_code)]

use std::{sync::Arc, time::Duration};
use vaultplay_contracts::DurableStorage;
use vaultplay_core::{
    GatePolicy,
    entitlement::EntitlementStore,
    infra::{
        TimeProvider, VirtualTimeProvider,
        storage::MemoryStorage,
        testing::{RecordingMedia, RecordingObserver, RecordingSurface},
    },
    playback::{
        GatingOverlay, ManualPreviewScheduler, PlaybackMachine, PreviewScheduler,
    },
    progress::ProgressStore,
};
use vaultplay_model::{
    ContentDescriptor, ContentRef, PlanCatalog, PlanId, PlaybackState,
    PurchaseReceipt,
};

pub const MERCH_CODE: &str = "DROP-2025";

pub struct Parts {
    pub machine: PlaybackMachine,
    pub media: RecordingMedia,
    pub surface: RecordingSurface,
    pub observer: RecordingObserver,
    pub entitlements: Arc<EntitlementStore>,
}

pub fn build_machine(
    storage: Arc<dyn DurableStorage>,
    scheduler: Arc<dyn PreviewScheduler>,
    clock: Arc<dyn TimeProvider>,
) -> Parts {
    let policy = GatePolicy::default();
    let observer = RecordingObserver::new();
    let entitlements = Arc::new(EntitlementStore::open(
        storage.clone(),
        Arc::new(observer.clone()),
    ));
    let progress = ProgressStore::new(storage, Arc::new(observer.clone()))
        .with_completion_threshold(policy.completion_threshold);
    let media = RecordingMedia::new();
    let surface = RecordingSurface::new();
    let overlay = GatingOverlay::new(
        PlanCatalog::default(),
        entitlements.clone(),
        Box::new(surface.clone()),
        clock.clone(),
    )
    .with_merch_claim_code(MERCH_CODE);

    let machine = PlaybackMachine::new(
        policy,
        entitlements.clone(),
        progress,
        scheduler,
        Box::new(media.clone()),
        overlay,
        clock,
    );
    Parts {
        machine,
        media,
        surface,
        observer,
        entitlements,
    }
}

/// Machine on a virtual clock with a manually drained scheduler.
pub struct Harness {
    pub machine: PlaybackMachine,
    pub media: RecordingMedia,
    pub surface: RecordingSurface,
    pub observer: RecordingObserver,
    pub entitlements: Arc<EntitlementStore>,
    pub scheduler: ManualPreviewScheduler,
    pub clock: VirtualTimeProvider,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    pub fn with_storage(storage: Arc<dyn DurableStorage>) -> Self {
        let clock = VirtualTimeProvider::new();
        let scheduler = ManualPreviewScheduler::new();
        let parts = build_machine(
            storage,
            Arc::new(scheduler.clone()),
            Arc::new(clock.clone()),
        );
        Self {
            machine: parts.machine,
            media: parts.media,
            surface: parts.surface,
            observer: parts.observer,
            entitlements: parts.entitlements,
            scheduler,
            clock,
        }
    }

    /// Advance the clock and deliver every ticket that came due.
    pub fn advance(&mut self, by: Duration) {
        self.clock.advance(by);
        for ticket in self.scheduler.take_due(self.clock.now()) {
            self.machine.on_preview_timer_fired(ticket);
        }
    }

    /// Play for up to `seconds`, reporting one time update per second like
    /// a media element would. Stops early once playback leaves `Playing`.
    pub fn play_for(&mut self, seconds: u64) {
        for _ in 0..seconds {
            if self.machine.state() != PlaybackState::Playing {
                return;
            }
            self.advance(Duration::from_secs(1));
            let position = self.machine.position() + 1.0;
            self.machine.on_time_update(position);
        }
    }
}

pub fn content_ref(series: &str, episode: &str) -> ContentRef {
    ContentRef::new(series, episode).expect("valid content ref")
}

pub fn premium(episode: &str) -> ContentDescriptor {
    ContentDescriptor::new(content_ref("series", episode), true)
        .with_duration(600.0)
}

pub fn free(episode: &str) -> ContentDescriptor {
    ContentDescriptor::new(content_ref("series", episode), false)
        .with_duration(600.0)
}

pub fn receipt(plan: &str) -> PurchaseReceipt {
    PurchaseReceipt::new(PlanId::new(plan).expect("valid plan id"), "test-proof")
}
