use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};
use vaultplay_contracts::MediaPrimitive;
use vaultplay_model::{
    ContentDescriptor, ContentRef, GateDecision, GateView, MediaEvent, Plan,
    PlanId, PlaybackSnapshot, PlaybackState, PurchaseReceipt,
};

use super::overlay::GatingOverlay;
use super::scheduler::PreviewScheduler;
use super::timer::{PreviewTicket, PreviewTimer};
use crate::entitlement::EntitlementStore;
use crate::error::{GateError, Result};
use crate::gate;
use crate::infra::time::TimeProvider;
use crate::policy::GatePolicy;
use crate::progress::ProgressStore;

#[derive(Debug)]
struct LoadedContent {
    descriptor: ContentDescriptor,
    position: f64,
    duration: f64,
    /// A preview window for this instance ran out and no entitlement has
    /// superseded it since.
    preview_expired: bool,
}

/// Playback state machine for one player instance.
///
/// Owns the preview timer and drives the media primitive and the gate
/// overlay. All inputs (user commands, media events, timer tickets,
/// entitlement changes) are plain `&mut self` calls processed one at a
/// time; see [`PlaybackSession`](super::session::PlaybackSession) for the
/// async driver.
#[derive(Debug)]
pub struct PlaybackMachine {
    state: PlaybackState,
    content: Option<LoadedContent>,
    policy: GatePolicy,
    entitlements: Arc<EntitlementStore>,
    progress: ProgressStore,
    timer: PreviewTimer,
    pending_ticket: Option<PreviewTicket>,
    scheduler: Arc<dyn PreviewScheduler>,
    media: Box<dyn MediaPrimitive>,
    overlay: GatingOverlay,
    clock: Arc<dyn TimeProvider>,
}

impl PlaybackMachine {
    /// The policy's completion threshold is applied to `progress`.
    pub fn new(
        policy: GatePolicy,
        entitlements: Arc<EntitlementStore>,
        progress: ProgressStore,
        scheduler: Arc<dyn PreviewScheduler>,
        media: Box<dyn MediaPrimitive>,
        overlay: GatingOverlay,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            state: PlaybackState::Stopped,
            content: None,
            timer: PreviewTimer::new(policy.preview_limit),
            progress: progress.with_completion_threshold(policy.completion_threshold),
            policy,
            entitlements,
            pending_ticket: None,
            scheduler,
            media,
            overlay,
            clock,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn content(&self) -> Option<&ContentDescriptor> {
        self.content.as_ref().map(|loaded| &loaded.descriptor)
    }

    pub fn position(&self) -> f64 {
        self.content.as_ref().map_or(0.0, |loaded| loaded.position)
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub fn entitlements(&self) -> &Arc<EntitlementStore> {
        &self.entitlements
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn overlay(&self) -> &GatingOverlay {
        &self.overlay
    }

    pub fn is_preview_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Load `descriptor`, seeking to its saved offset before any play.
    ///
    /// Returns the resumed offset, if any.
    pub fn open(&mut self, descriptor: ContentDescriptor) -> Option<f64> {
        if self.content.is_some() {
            self.close();
        }

        let resume = self.progress.load(&descriptor.content_ref);
        if let Some(offset) = resume {
            self.media.seek(offset);
        }

        info!(
            target: "vaultplay::playback",
            content = %descriptor.content_ref,
            premium = descriptor.is_premium,
            resume_at = ?resume,
            "content opened"
        );

        self.content = Some(LoadedContent {
            duration: descriptor.duration_seconds,
            position: resume.unwrap_or(0.0),
            preview_expired: false,
            descriptor,
        });
        self.state = PlaybackState::Stopped;
        resume
    }

    /// Start or resume playback, subject to the gate.
    pub fn play(&mut self) -> Result<GateDecision> {
        let content_ref = self.loaded()?.descriptor.content_ref.clone();
        if self.state == PlaybackState::Playing {
            return Err(self.reject("play"));
        }

        let decision = self.decide(self.consumed_preview());
        match decision {
            GateDecision::Allowed => {
                self.cancel_timer();
                self.enter_playing();
            }
            GateDecision::PreviewAllowed => {
                let ticket = self.timer.start(self.clock.now())?;
                self.scheduler.schedule(ticket);
                self.pending_ticket = Some(ticket);
                debug!(
                    target: "vaultplay::playback",
                    content = %content_ref,
                    generation = ticket.generation,
                    limit = ?self.timer.limit(),
                    "preview window started"
                );
                self.enter_playing();
            }
            GateDecision::Blocked => {
                info!(target: "vaultplay::playback", content = %content_ref, "play refused; preview expired");
                self.state = PlaybackState::GatedPreviewExpired;
                if !self.overlay.is_visible() {
                    self.overlay.present(&content_ref);
                }
            }
        }
        Ok(decision)
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Err(self.reject("pause"));
        }
        self.cancel_timer();
        self.media.pause();
        self.transition(PlaybackState::Paused);
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<PlaybackState> {
        if self.state == PlaybackState::Playing {
            self.pause()?;
        } else {
            self.play()?;
        }
        Ok(self.state)
    }

    /// Deliver a scheduled preview ticket. Returns whether it gated playback.
    pub fn on_preview_timer_fired(&mut self, ticket: PreviewTicket) -> bool {
        let Some(expired) = self.timer.on_fire(ticket) else {
            debug!(
                target: "vaultplay::playback",
                generation = ticket.generation,
                "stale preview ticket dropped"
            );
            return false;
        };
        if self.pending_ticket.map(|t| t.generation) == Some(expired.generation) {
            self.pending_ticket = None;
        }
        if self.state != PlaybackState::Playing {
            return false;
        }
        // Entitlement may have arrived without a notification.
        if self.decide(self.timer.limit()) == GateDecision::Allowed {
            return false;
        }
        self.expire_preview();
        true
    }

    pub fn on_time_update(&mut self, offset_seconds: f64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(loaded) = self.content.as_mut() else {
            return;
        };
        loaded.position = offset_seconds;
        self.progress.save(
            &loaded.descriptor.content_ref,
            offset_seconds,
            loaded.duration,
        );

        if self.timer.is_running() {
            let elapsed = self.timer.elapsed(self.clock.now());
            if self.decide(elapsed) == GateDecision::Blocked {
                debug!(target: "vaultplay::playback", ?elapsed, "preview limit reached before ticket delivery");
                self.cancel_timer();
                self.expire_preview();
            }
        }
    }

    pub fn on_duration_known(&mut self, duration_seconds: f64) {
        if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
            return;
        }
        if let Some(loaded) = self.content.as_mut() {
            loaded.duration = duration_seconds;
        }
    }

    /// The primitive started playing on its own; apply the gate and pause it
    /// back if refused.
    pub fn on_play(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            return Ok(());
        }
        match self.play() {
            Ok(GateDecision::Blocked) => {
                self.media.pause();
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(err) => {
                self.media.pause();
                Err(err)
            }
        }
    }

    /// The primitive paused on its own.
    pub fn on_pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.cancel_timer();
            self.transition(PlaybackState::Paused);
        }
    }

    pub fn on_media_error(&mut self, message: &str) {
        warn!(target: "vaultplay::playback", state = %self.state, message, "media error");
        self.cancel_timer();
        self.transition(PlaybackState::Stopped);
        self.overlay.playback_failed(message);
    }

    /// Route a media primitive event to its handler.
    pub fn handle_media_event(&mut self, event: MediaEvent) -> Result<()> {
        match event {
            MediaEvent::TimeUpdate { offset_seconds } => {
                self.on_time_update(offset_seconds)
            }
            MediaEvent::DurationKnown { duration_seconds } => {
                self.on_duration_known(duration_seconds)
            }
            MediaEvent::Played => self.on_play()?,
            MediaEvent::Paused => self.on_pause(),
            MediaEvent::Failed { message } => self.on_media_error(&message),
        }
        Ok(())
    }

    /// Seek within the loaded content. Returns the clamped target.
    pub fn seek(&mut self, offset_seconds: f64) -> Result<f64> {
        let loaded = self.loaded_mut()?;
        let mut target = if offset_seconds.is_nan() {
            loaded.position
        } else {
            offset_seconds.max(0.0)
        };
        if loaded.duration > 0.0 {
            target = target.min(loaded.duration);
        } else if !target.is_finite() {
            target = loaded.position;
        }
        loaded.position = target;
        self.media.seek(target);
        Ok(target)
    }

    /// Seek relative to the current position.
    pub fn skip(&mut self, delta_seconds: f64) -> Result<f64> {
        let position = self.loaded()?.position;
        self.seek(position + delta_seconds)
    }

    pub fn skip_forward(&mut self) -> Result<f64> {
        self.skip(self.policy.skip_interval.as_secs_f64())
    }

    pub fn skip_backward(&mut self) -> Result<f64> {
        self.skip(-self.policy.skip_interval.as_secs_f64())
    }

    /// Re-evaluate the loaded content after an entitlement change. Returns
    /// whether the gate was lifted.
    pub fn on_entitlement_changed(&mut self) -> bool {
        let Some(loaded) = self.content.as_mut() else {
            return false;
        };
        if !loaded.descriptor.is_premium
            || !self.entitlements.is_entitled(&loaded.descriptor.content_ref)
        {
            return false;
        }

        loaded.preview_expired = false;
        self.cancel_timer();
        if matches!(
            self.overlay.view(),
            GateView::PlanSelection { .. } | GateView::Checkout { .. }
        ) {
            self.overlay.dismiss();
        }
        if self.state == PlaybackState::GatedPreviewExpired {
            self.transition(PlaybackState::Paused);
        }
        true
    }

    pub fn on_purchase_succeeded(&mut self, receipt: &PurchaseReceipt) -> Result<Plan> {
        let plan = self.overlay.complete_purchase(receipt)?;
        self.on_entitlement_changed();
        Ok(plan)
    }

    pub fn select_plan(&mut self, plan_id: &PlanId) -> Result<()> {
        self.overlay.select_plan(plan_id)
    }

    pub fn back_to_plans(&mut self) {
        self.overlay.back();
    }

    pub fn dismiss_gate(&mut self) {
        self.overlay.dismiss();
    }

    /// Stop playback and unload the content.
    pub fn close(&mut self) {
        self.cancel_timer();
        if self.state == PlaybackState::Playing {
            self.media.pause();
        }
        self.overlay.reset();
        if let Some(loaded) = self.content.take() {
            debug!(target: "vaultplay::playback", content = %loaded.descriptor.content_ref, "content closed");
        }
        self.state = PlaybackState::Stopped;
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            content: self
                .content
                .as_ref()
                .map(|loaded| loaded.descriptor.content_ref.clone()),
            position_seconds: self.position(),
            duration_seconds: self
                .content
                .as_ref()
                .map_or(0.0, |loaded| loaded.duration),
            preview_remaining: self.timer.remaining(self.clock.now()),
            gate: self.overlay.view().clone(),
        }
    }

    fn loaded(&self) -> Result<&LoadedContent> {
        self.content.as_ref().ok_or(GateError::NoContent)
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedContent> {
        self.content.as_mut().ok_or(GateError::NoContent)
    }

    fn consumed_preview(&self) -> Duration {
        match &self.content {
            Some(loaded) if loaded.preview_expired => self.timer.limit(),
            _ => self.timer.elapsed(self.clock.now()),
        }
    }

    fn decide(&self, elapsed: Duration) -> GateDecision {
        match &self.content {
            Some(loaded) => gate::decide(
                &loaded.descriptor,
                &self.entitlements.snapshot(),
                elapsed,
                self.timer.limit(),
            ),
            None => GateDecision::Blocked,
        }
    }

    fn content_ref(&self) -> Option<ContentRef> {
        self.content
            .as_ref()
            .map(|loaded| loaded.descriptor.content_ref.clone())
    }

    fn enter_playing(&mut self) {
        self.media.play();
        self.transition(PlaybackState::Playing);
    }

    fn expire_preview(&mut self) {
        self.media.pause();
        if let Some(loaded) = self.content.as_mut() {
            loaded.preview_expired = true;
        }
        self.transition(PlaybackState::GatedPreviewExpired);
        if let Some(content_ref) = self.content_ref() {
            info!(target: "vaultplay::playback", content = %content_ref, "preview expired");
            self.overlay.present(&content_ref);
        }
    }

    fn cancel_timer(&mut self) {
        self.timer.cancel();
        if let Some(ticket) = self.pending_ticket.take() {
            self.scheduler.revoke(ticket);
        }
    }

    fn transition(&mut self, next: PlaybackState) {
        if self.state != next {
            debug!(target: "vaultplay::playback", from = %self.state, to = %next, "state transition");
            self.state = next;
        }
    }

    fn reject(&self, action: &'static str) -> GateError {
        warn!(target: "vaultplay::playback", state = %self.state, action, "invalid transition rejected");
        GateError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}
