//! Randomized delay between consecutive sends

use crate::error::DispatchError;
use rand::Rng;
use std::time::Duration;

/// Inclusive window the inter-message delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingWindow {
    min: Duration,
    max: Duration,
}

impl Default for PacingWindow {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(5_000),
            max: Duration::from_millis(12_000),
        }
    }
}

impl PacingWindow {
    /// Create a window; `min` must not exceed `max`
    pub fn new(min: Duration, max: Duration) -> Result<Self, DispatchError> {
        if min > max {
            return Err(DispatchError::InvalidConfig(format!(
                "minimum delay {:?} exceeds maximum delay {:?}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Window that always yields the same delay
    pub fn fixed(delay: Duration) -> Self {
        Self { min: delay, max: delay }
    }

    /// Lower bound
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Whether `delay` falls inside the window (bounds included)
    pub fn contains(&self, delay: Duration) -> bool {
        delay >= self.min && delay <= self.max
    }

    /// Draw the next delay uniformly from the window
    pub fn next_delay(&self) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}
