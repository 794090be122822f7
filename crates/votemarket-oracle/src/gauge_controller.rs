//! In-process gauge controller.
//!
//! Mirrors the voting controller's `time_total`: the stored start of the next
//! epoch, always a multiple of [`WEEK`]. Checkpointing once wall-clock time
//! has reached the stored boundary moves it forward by exactly one week.

use votemarket_types::{Timestamp, WEEK};

use crate::{Clock, EpochOracle, OracleError, Result};

/// Gauge controller oracle driven by a [`Clock`].
pub struct GaugeController<C: Clock> {
    time_total: Timestamp,
    clock: C,
}

impl<C: Clock> GaugeController<C> {
    /// Create a controller whose stored boundary starts at `epoch_start`,
    /// floored to a week boundary.
    pub fn new(epoch_start: Timestamp, clock: C) -> Self {
        Self {
            time_total: align_to_week(epoch_start),
            clock,
        }
    }

    /// Create a controller positioned at the week boundary following the
    /// clock's current time.
    pub fn starting_now(clock: C) -> Self {
        let next = align_to_week(clock.now()).saturating_add(WEEK);
        Self {
            time_total: next,
            clock,
        }
    }

    /// The clock driving this controller.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> EpochOracle for GaugeController<C> {
    fn current_epoch_start(&self) -> Timestamp {
        self.time_total
    }

    fn checkpoint(&mut self) -> Result<Timestamp> {
        let now = self.clock.now();
        if self.time_total <= now {
            let next = self
                .time_total
                .checked_add(WEEK)
                .ok_or(OracleError::Overflow(self.time_total))?;
            tracing::info!(
                previous = self.time_total,
                current = next,
                now,
                "gauge controller: epoch boundary advanced"
            );
            self.time_total = next;
        }
        Ok(self.time_total)
    }
}

/// Floor a timestamp to the start of its week.
pub fn align_to_week(ts: Timestamp) -> Timestamp {
    ts / WEEK * WEEK
}
