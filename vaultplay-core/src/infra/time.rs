//! Clock abstraction for the preview window.
//!
//! The playback machine reads wall-clock time and the tokio scheduler sleeps
//! through a [`TimeProvider`], so tests and the CLI simulation can run the
//! 30 second preview window on a [`VirtualTimeProvider`] without waiting.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of monotonic and wall-clock time.
pub trait TimeProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Monotonic reading used for preview deadlines.
    fn now(&self) -> Instant;

    /// Wall-clock reading recorded on purchases.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Resolves once `duration` has passed on this clock.
    fn sleep(&self, duration: Duration) -> Sleep;
}

/// Real time, backed by `Instant`, `Utc::now` and `tokio::time`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same clock. Sleeps register a waiter that
/// [`advance`](Self::advance) wakes once its deadline is reached; a sleep
/// dropped before then (an aborted task) removes its waiter.
#[derive(Clone, Debug)]
pub struct VirtualTimeProvider {
    shared: Arc<Mutex<ClockState>>,
}

#[derive(Debug)]
struct ClockState {
    instant: Instant,
    utc: DateTime<Utc>,
    next_waiter: u64,
    waiters: Vec<Waiter>,
}

#[derive(Debug)]
struct Waiter {
    id: u64,
    deadline: Instant,
    waker: Waker,
}

impl VirtualTimeProvider {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Clock whose wall-clock side starts at `utc`.
    pub fn starting_at(utc: DateTime<Utc>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(ClockState {
                instant: Instant::now(),
                utc,
                next_waiter: 0,
                waiters: Vec::new(),
            })),
        }
    }

    /// Move the clock forward and wake every sleep that is now due.
    pub fn advance(&self, by: Duration) {
        let wake: Vec<Waker> = {
            let mut state = self.shared.lock();
            state.instant += by;
            state.utc += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
            let now = state.instant;

            let (due, waiting): (Vec<_>, Vec<_>) = state
                .waiters
                .drain(..)
                .partition(|waiter| waiter.deadline <= now);
            state.waiters = waiting;
            due.into_iter().map(|waiter| waiter.waker).collect()
        };

        for waker in wake {
            waker.wake();
        }
    }

    /// Jump to the earliest pending deadline. Returns the step taken.
    pub fn advance_to_next_deadline(&self) -> Option<Duration> {
        let step = {
            let state = self.shared.lock();
            let deadline = state.waiters.iter().map(|waiter| waiter.deadline).min()?;
            deadline.saturating_duration_since(state.instant)
        };
        self.advance(step);
        Some(step)
    }

    /// Sleeps currently parked on this clock.
    pub fn pending_timers(&self) -> usize {
        self.shared.lock().waiters.len()
    }
}

impl Default for VirtualTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for VirtualTimeProvider {
    fn now(&self) -> Instant {
        self.shared.lock().instant
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.shared.lock().utc
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(VirtualSleep {
            deadline: self.now() + duration,
            clock: self.clone(),
            waiter: None,
        })
    }
}

struct VirtualSleep {
    clock: VirtualTimeProvider,
    deadline: Instant,
    waiter: Option<u64>,
}

impl Future for VirtualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let clock = self.clock.clone();
        let mut state = clock.shared.lock();
        if state.instant >= self.deadline {
            self.waiter = None;
            return Poll::Ready(());
        }

        match self.waiter {
            Some(id) => {
                if let Some(waiter) =
                    state.waiters.iter_mut().find(|waiter| waiter.id == id)
                {
                    waiter.waker.clone_from(cx.waker());
                }
            }
            None => {
                let id = state.next_waiter;
                state.next_waiter += 1;
                state.waiters.push(Waiter {
                    id,
                    deadline: self.deadline,
                    waker: cx.waker().clone(),
                });
                self.waiter = Some(id);
            }
        }
        Poll::Pending
    }
}

impl Drop for VirtualSleep {
    fn drop(&mut self) {
        if let Some(id) = self.waiter.take() {
            self.clock.shared.lock().waiters.retain(|waiter| waiter.id != id);
        }
    }
}
