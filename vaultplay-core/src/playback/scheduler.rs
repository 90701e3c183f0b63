//! Delivery of preview tickets at their deadline.

use parking_lot::Mutex;
use std::{collections::HashMap, fmt, sync::Arc, time::Instant};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{trace, warn};

use super::timer::PreviewTicket;
use crate::infra::time::TimeProvider;

/// Arranges for a ticket to be handed back to the machine at its deadline.
pub trait PreviewScheduler: Send + Sync + fmt::Debug {
    fn schedule(&self, ticket: PreviewTicket);

    /// Best effort; the timer's generation check drops anything that slips
    /// through.
    fn revoke(&self, ticket: PreviewTicket);
}

/// Sleeps on a [`TimeProvider`] in a spawned task per ticket and sends the
/// ticket back over an mpsc channel.
pub struct TokioPreviewScheduler {
    clock: Arc<dyn TimeProvider>,
    fired: mpsc::UnboundedSender<PreviewTicket>,
    tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl fmt::Debug for TokioPreviewScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioPreviewScheduler")
            .field("clock", &self.clock)
            .field("pending", &self.tasks.lock().len())
            .finish()
    }
}

impl TokioPreviewScheduler {
    pub fn new(
        clock: Arc<dyn TimeProvider>,
    ) -> (Self, mpsc::UnboundedReceiver<PreviewTicket>) {
        let (fired, rx) = mpsc::unbounded_channel();
        (
            Self {
                clock,
                fired,
                tasks: Mutex::new(HashMap::new()),
            },
            rx,
        )
    }

    pub fn pending(&self) -> usize {
        let mut tasks = self.tasks.lock();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.len()
    }
}

impl PreviewScheduler for TokioPreviewScheduler {
    fn schedule(&self, ticket: PreviewTicket) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(
                target: "vaultplay::timer",
                generation = ticket.generation,
                "no tokio runtime; preview ticket not scheduled"
            );
            return;
        };

        let delay = ticket.deadline.saturating_duration_since(self.clock.now());
        let sleep = self.clock.sleep(delay);
        let fired = self.fired.clone();
        let handle = runtime.spawn(async move {
            sleep.await;
            // Receiver gone means the session ended.
            let _ = fired.send(ticket);
        });

        let mut tasks = self.tasks.lock();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.insert(ticket.generation, handle);
        trace!(target: "vaultplay::timer", generation = ticket.generation, ?delay, "preview ticket scheduled");
    }

    fn revoke(&self, ticket: PreviewTicket) {
        if let Some(handle) = self.tasks.lock().remove(&ticket.generation) {
            handle.abort();
            trace!(target: "vaultplay::timer", generation = ticket.generation, "preview ticket revoked");
        }
    }
}

impl Drop for TokioPreviewScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}

/// Queues tickets for the host to drain; used for headless simulation.
#[derive(Debug, Clone, Default)]
pub struct ManualPreviewScheduler {
    queue: Arc<Mutex<Vec<PreviewTicket>>>,
}

impl ManualPreviewScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every ticket whose deadline is at or before `now`.
    pub fn take_due(&self, now: Instant) -> Vec<PreviewTicket> {
        let mut queue = self.queue.lock();
        let (due, pending): (Vec<_>, Vec<_>) =
            queue.drain(..).partition(|ticket| ticket.deadline <= now);
        *queue = pending;
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.lock().iter().map(|ticket| ticket.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl PreviewScheduler for ManualPreviewScheduler {
    fn schedule(&self, ticket: PreviewTicket) {
        self.queue.lock().push(ticket);
    }

    fn revoke(&self, ticket: PreviewTicket) {
        self.queue
            .lock()
            .retain(|queued| queued.generation != ticket.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::time::VirtualTimeProvider;
    use std::time::Duration;

    fn ticket(generation: u64, deadline: Instant) -> PreviewTicket {
        PreviewTicket {
            generation,
            deadline,
        }
    }

    #[test]
    fn manual_scheduler_drains_due_tickets() {
        let now = Instant::now();
        let scheduler = ManualPreviewScheduler::new();
        scheduler.schedule(ticket(1, now + Duration::from_secs(30)));
        scheduler.schedule(ticket(2, now + Duration::from_secs(60)));

        assert!(scheduler.take_due(now).is_empty());
        let due = scheduler.take_due(now + Duration::from_secs(30));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].generation, 1);
        assert_eq!(scheduler.next_deadline(), Some(now + Duration::from_secs(60)));
    }

    #[test]
    fn manual_scheduler_revokes() {
        let now = Instant::now();
        let scheduler = ManualPreviewScheduler::new();
        let t = ticket(7, now);
        scheduler.schedule(t);
        scheduler.revoke(t);
        assert!(scheduler.is_empty());
    }

    #[tokio::test]
    async fn tokio_scheduler_fires_on_virtual_clock() {
        let clock = VirtualTimeProvider::new();
        let (scheduler, mut rx) = TokioPreviewScheduler::new(Arc::new(clock.clone()));
        let t = ticket(1, clock.now() + Duration::from_secs(30));
        scheduler.schedule(t);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());

        clock.advance(Duration::from_secs(30));
        assert_eq!(rx.recv().await, Some(t));
    }

    #[tokio::test]
    async fn tokio_scheduler_revoke_aborts_sleep() {
        let clock = VirtualTimeProvider::new();
        let (scheduler, mut rx) = TokioPreviewScheduler::new(Arc::new(clock.clone()));
        let t = ticket(1, clock.now() + Duration::from_secs(30));
        scheduler.schedule(t);
        scheduler.revoke(t);

        tokio::time::sleep(Duration::from_millis(10)).await;
        clock.advance(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.pending(), 0);
    }
}
