//! Preview window timer.
//!
//! The timer itself never sleeps. `start` hands back a [`PreviewTicket`]
//! that a [`PreviewScheduler`](super::scheduler::PreviewScheduler) delivers
//! at the deadline; `on_fire` only honours the ticket of the current run, so
//! a callback that was already in flight when the user paused is dropped.

use std::time::{Duration, Instant};

use crate::error::{GateError, Result};

/// Handle for one scheduled expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewTicket {
    pub generation: u64,
    pub deadline: Instant,
}

/// Emitted once per started window when its ticket fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewExpired {
    pub generation: u64,
    pub started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Idle,
    Running { started_at: Instant, generation: u64 },
}

#[derive(Debug)]
pub struct PreviewTimer {
    limit: Duration,
    state: TimerState,
    next_generation: u64,
}

impl PreviewTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            state: TimerState::Idle,
            next_generation: 1,
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Open a fresh window at `now`.
    pub fn start(&mut self, now: Instant) -> Result<PreviewTicket> {
        if self.is_running() {
            return Err(GateError::TimerAlreadyRunning);
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.state = TimerState::Running {
            started_at: now,
            generation,
        };
        Ok(PreviewTicket {
            generation,
            deadline: now + self.limit,
        })
    }

    /// Return to `Idle`. The outstanding ticket, if any, becomes stale.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = TimerState::Idle;
        was_running
    }

    pub fn on_fire(&mut self, ticket: PreviewTicket) -> Option<PreviewExpired> {
        match self.state {
            TimerState::Running {
                started_at,
                generation,
            } if generation == ticket.generation => {
                self.state = TimerState::Idle;
                Some(PreviewExpired {
                    generation,
                    started_at,
                })
            }
            _ => None,
        }
    }

    /// Time consumed in the running window, zero when idle.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.state {
            TimerState::Running { started_at, .. } => {
                now.saturating_duration_since(started_at)
            }
            TimerState::Idle => Duration::ZERO,
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.is_running()
            .then(|| self.limit.saturating_sub(self.elapsed(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(30);

    #[test]
    fn start_issues_ticket_at_deadline() {
        let now = Instant::now();
        let mut timer = PreviewTimer::new(LIMIT);
        let ticket = timer.start(now).unwrap();

        assert!(timer.is_running());
        assert_eq!(ticket.deadline, now + LIMIT);
        assert_eq!(timer.remaining(now + Duration::from_secs(10)), Some(Duration::from_secs(20)));
    }

    #[test]
    fn second_start_is_rejected() {
        let now = Instant::now();
        let mut timer = PreviewTimer::new(LIMIT);
        timer.start(now).unwrap();
        assert!(matches!(
            timer.start(now),
            Err(GateError::TimerAlreadyRunning)
        ));
    }

    #[test]
    fn fire_is_effective_once() {
        let now = Instant::now();
        let mut timer = PreviewTimer::new(LIMIT);
        let ticket = timer.start(now).unwrap();

        let expired = timer.on_fire(ticket).unwrap();
        assert_eq!(expired.started_at, now);
        assert!(!timer.is_running());
        assert_eq!(timer.on_fire(ticket), None);
    }

    #[test]
    fn cancelled_ticket_is_stale() {
        let now = Instant::now();
        let mut timer = PreviewTimer::new(LIMIT);
        let first = timer.start(now).unwrap();
        assert!(timer.cancel());
        assert!(!timer.cancel());

        let second = timer.start(now + Duration::from_secs(5)).unwrap();
        assert_ne!(first.generation, second.generation);
        assert_eq!(timer.on_fire(first), None);
        assert!(timer.is_running());
        assert!(timer.on_fire(second).is_some());
    }

    #[test]
    fn elapsed_is_zero_when_idle() {
        let timer = PreviewTimer::new(LIMIT);
        assert_eq!(timer.elapsed(Instant::now()), Duration::ZERO);
        assert_eq!(timer.remaining(Instant::now()), None);
    }
}
