//! Supervisory timer
//!
//! Decides when the link/session health check runs. Without a baseline
//! the check is due immediately; afterwards it is due once per interval.
//! Instants are compared with wrapping arithmetic, the same way a
//! free-running millisecond counter is usually handled on bare metal.

/// Interval timer for the reconnection protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SupervisoryTimer {
    last_check_ms: Option<u64>,
    interval_ms: u64,
}

impl SupervisoryTimer {
    /// Timer whose first deadline has already elapsed
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            last_check_ms: None,
            interval_ms,
        }
    }

    /// Configured interval
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Instant of the last check, if any
    pub fn last_check_ms(&self) -> Option<u64> {
        self.last_check_ms
    }

    /// Whether a check is due at `now_ms`
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_check_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) >= self.interval_ms,
        }
    }

    /// Record `now_ms` as the last check
    pub fn reset(&mut self, now_ms: u64) {
        self.last_check_ms = Some(now_ms);
    }

    /// Record `now_ms` if a check is due; returns whether it was
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.reset(now_ms);
            true
        } else {
            false
        }
    }
}
