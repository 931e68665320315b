//! Per-node processing time diagnostics.
//!
//! [`TimingStats`] keeps the most recent measurement and a rolling average
//! over the last [`TIMING_WINDOW`] measurements, plus a count of failed ticks.
//! The numbers are read-only diagnostics; nothing in the scheduler reads them.

use std::collections::VecDeque;
use std::time::Duration;

/// Number of measurements in the rolling average.
pub const TIMING_WINDOW: usize = 50;

/// Timing and failure record for one node.
#[derive(Clone, Debug, Default)]
pub struct TimingStats {
    window: VecDeque<Duration>,
    window_sum: Duration,
    last: Option<Duration>,
    samples: u64,
    failures: u64,
    last_error: Option<String>,
}

impl TimingStats {
    /// Records one processing duration.
    pub fn record(&mut self, elapsed: Duration) {
        if self.window.len() == TIMING_WINDOW
            && let Some(oldest) = self.window.pop_front()
        {
            self.window_sum = self.window_sum.saturating_sub(oldest);
        }
        self.window.push_back(elapsed);
        self.window_sum += elapsed;
        self.last = Some(elapsed);
        self.samples += 1;
    }

    /// Records a failed tick.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failures += 1;
        self.last_error = Some(message.into());
    }

    /// Most recent measurement.
    pub fn last(&self) -> Option<Duration> {
        self.last
    }

    /// Mean of the measurements in the rolling window.
    pub fn average(&self) -> Option<Duration> {
        let n = u32::try_from(self.window.len()).ok().filter(|&n| n > 0)?;
        Some(self.window_sum / n)
    }

    /// Total measurements recorded.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Total failed ticks.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
