//! Scripted timers and the combinators that wait on them.
//!
//! A `ScriptedTimer` settles with a fixed outcome after a fixed delay.
//! `race` reports whichever timer settles first; `all_settled` waits for
//! every timer and reports their outcomes in input order.

use std::time::Duration;

use futures::future::{join_all, select_all, FutureExt};
use tokio::time::sleep;

use crate::SimError;

/// Multiplier applied to every simulated delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale(f64);

impl Default for TimeScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl TimeScale {
    /// Largest accepted slowdown.
    pub const MAX_FACTOR: f64 = 1000.0;

    /// Negative and non-finite factors fall back to real time; factors above
    /// `MAX_FACTOR` are capped.
    pub fn new(factor: f64) -> Self {
        if factor.is_finite() && factor >= 0.0 {
            Self(factor.min(Self::MAX_FACTOR))
        } else {
            Self::default()
        }
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Scale `d`, saturating at `Duration::MAX` instead of overflowing.
    pub fn apply(self, d: Duration) -> Duration {
        if self.0 == 1.0 {
            d
        } else {
            Duration::try_from_secs_f64(d.as_secs_f64() * self.0).unwrap_or(Duration::MAX)
        }
    }

    /// Sleep for `ms` milliseconds of scaled time.
    pub async fn sleep_ms(self, ms: u64) {
        sleep(self.apply(Duration::from_millis(ms))).await;
    }
}

/// How a timer settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Fulfilled(String),
    Rejected(String),
}

impl Settlement {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }

    /// The resolved value or the rejection reason.
    pub fn message(&self) -> &str {
        match self {
            Settlement::Fulfilled(v) | Settlement::Rejected(v) => v,
        }
    }
}

/// A delay that ends in a predetermined settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedTimer {
    pub after: Duration,
    pub settlement: Settlement,
}

impl ScriptedTimer {
    pub fn fulfill(ms: u64, value: impl Into<String>) -> Self {
        Self {
            after: Duration::from_millis(ms),
            settlement: Settlement::Fulfilled(value.into()),
        }
    }

    pub fn reject(ms: u64, reason: impl Into<String>) -> Self {
        Self {
            after: Duration::from_millis(ms),
            settlement: Settlement::Rejected(reason.into()),
        }
    }

    pub async fn run(self, scale: TimeScale) -> Settlement {
        sleep(scale.apply(self.after)).await;
        self.settlement
    }
}

/// Wait for the first timer to settle and return its settlement.
///
/// Ties go to the timer listed first.
pub async fn race(timers: Vec<ScriptedTimer>, scale: TimeScale) -> Result<Settlement, SimError> {
    if timers.is_empty() {
        return Err(SimError::EmptyRace);
    }
    let futures = timers.into_iter().map(|t| t.run(scale).boxed());
    let (winner, index, _rest) = select_all(futures).await;
    tracing::debug!(index, settled = ?winner, "race settled");
    Ok(winner)
}

/// Wait for every timer and return the settlements in input order.
pub async fn all_settled(timers: Vec<ScriptedTimer>, scale: TimeScale) -> Vec<Settlement> {
    join_all(timers.into_iter().map(|t| t.run(scale))).await
}
