//! Tick pacing.
//!
//! After a tick finishes at `now`, the next tick is due one period after the
//! previous deadline. If that moment has already passed, the next tick is due
//! immediately and the schedule re-anchors on `now`: a slow tick delays the
//! following ones but never causes catch-up ticks.

use std::time::{Duration, Instant};

/// Outcome of [`Pacer::finish_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPace {
    /// The next deadline is still ahead.
    OnTime,
    /// The tick overran its slot; the next tick starts immediately.
    Overrun,
}

/// Deadline bookkeeping for a fixed-rate loop.
#[derive(Debug, Clone)]
pub struct Pacer {
    period: Duration,
    deadline: Instant,
}

impl Pacer {
    /// First tick is due at `start`.
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            deadline: start,
        }
    }

    /// Target time between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// When the next tick is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// How long to sleep before the next tick; zero if it is already due.
    pub fn wait_time(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Schedules the next tick after one that finished at `now`.
    pub fn finish_tick(&mut self, now: Instant) -> TickPace {
        let next = self.deadline + self.period;
        if next > now {
            self.deadline = next;
            TickPace::OnTime
        } else {
            self.deadline = now;
            TickPace::Overrun
        }
    }
}
