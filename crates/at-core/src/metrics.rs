//! Gauge storage and the periodic random walk.
//!
//! Each gauge lives in its own `AtomicU64` holding the bits of an `f64`, so
//! the interpreter and the ticker can write concurrently from any thread.
//! Concurrent writes to one gauge resolve last-write-wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use at_protocol::{Gauge, GaugeKind, MetricSnapshot};
use at_sim::Dice;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::MetricsConfig;
use crate::session::Session;

/// Bounded values for every `GaugeKind`.
#[derive(Debug)]
pub struct MetricStore {
    values: [AtomicU64; 4],
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricStore {
    pub fn new() -> Self {
        Self {
            values: GaugeKind::ALL.map(|k| AtomicU64::new(k.initial().to_bits())),
        }
    }

    pub fn get(&self, kind: GaugeKind) -> f64 {
        f64::from_bits(self.values[kind.index()].load(Ordering::Acquire))
    }

    /// Store `value` clamped to `[0, max]`. Returns the stored value.
    pub fn set(&self, kind: GaugeKind, value: f64) -> f64 {
        let clamped = clamp(kind, value);
        self.values[kind.index()].store(clamped.to_bits(), Ordering::Release);
        clamped
    }

    /// Add `delta` atomically, clamping the result. Returns the new value.
    pub fn nudge(&self, kind: GaugeKind, delta: f64) -> f64 {
        let slot = &self.values[kind.index()];
        let mut current = slot.load(Ordering::Acquire);
        loop {
            let next = clamp(kind, f64::from_bits(current) + delta);
            match slot.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            gauges: GaugeKind::ALL
                .iter()
                .map(|&kind| Gauge {
                    kind,
                    value: self.get(kind),
                    max: kind.max(),
                })
                .collect(),
        }
    }
}

fn clamp(kind: GaugeKind, value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, kind.max())
}

/// Background task that random-walks the gauges and advances the uptime clock.
///
/// The task is aborted when the handle is dropped.
pub struct MetricTicker {
    handle: JoinHandle<()>,
}

/// Longest accepted tick interval: one hour.
const MAX_TICK_INTERVAL_MS: u64 = 60 * 60 * 1000;

/// Tick period from config, clamped to `[1ms, 1h]`.
pub fn tick_period(config: &MetricsConfig) -> Duration {
    Duration::from_millis(config.tick_interval_ms.clamp(1, MAX_TICK_INTERVAL_MS))
}

impl MetricTicker {
    pub fn spawn(session: Arc<Session>, dice: Arc<dyn Dice>, config: &MetricsConfig) -> Self {
        let period = tick_period(config);
        let amplitude = config.walk_amplitude;

        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                random_walk_step(&session, dice.as_ref(), amplitude);
            }
        });

        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for MetricTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One tick: move every non-derived gauge by `(draw - 0.5) * amplitude`.
pub fn random_walk_step(session: &Session, dice: &dyn Dice, amplitude: f64) {
    let deltas: Vec<(GaugeKind, f64)> = GaugeKind::ALL
        .iter()
        .filter(|k| !k.is_derived())
        .map(|&k| (k, (dice.roll() - 0.5) * amplitude))
        .collect();
    session.nudge_metrics(&deltas);
    let uptime = session.advance_uptime();
    tracing::trace!(uptime, "metrics tick");
}
