//! Shared state of one terminal session.
//!
//! `Session` owns the append-only log, the gauges, the set of in-flight
//! simulated operations and the outcome counters. Every mutation publishes a
//! `TerminalEvent` so rendering surfaces can follow along.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use at_protocol::{Counters, GaugeKind, LineKind, LogLine, MetricSnapshot, TerminalEvent};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::metrics::MetricStore;

const EVENT_CAPACITY: usize = 1024;

/// Opaque token for one in-flight simulated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(u64);

pub struct Session {
    log: Mutex<Vec<LogLine>>,
    metrics: MetricStore,
    active_ops: Mutex<BTreeSet<OperationId>>,
    next_op: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    uptime_secs: AtomicU64,
    started: Instant,
    events: broadcast::Sender<TerminalEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            log: Mutex::new(Vec::new()),
            metrics: MetricStore::new(),
            active_ops: Mutex::new(BTreeSet::new()),
            next_op: AtomicU64::new(1),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            uptime_secs: AtomicU64::new(0),
            started: Instant::now(),
            events,
        }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TerminalEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: TerminalEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Time since the session was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    // ── Log ─────────────────────────────────────────────────────────────

    /// Append a line to the log.
    pub fn emit(&self, text: impl Into<String>, kind: LineKind) -> LogLine {
        let line = LogLine::new(text, kind, self.elapsed());
        lock(&self.log).push(line.clone());
        self.publish(TerminalEvent::LineAppended(line.clone()));
        line
    }

    /// Append a line that front-ends should not animate.
    pub fn emit_static(&self, text: impl Into<String>, kind: LineKind) -> LogLine {
        let line = LogLine::new(text, kind, self.elapsed()).with_animated(false);
        lock(&self.log).push(line.clone());
        self.publish(TerminalEvent::LineAppended(line.clone()));
        line
    }

    pub fn lines(&self) -> Vec<LogLine> {
        lock(&self.log).clone()
    }

    pub fn line_count(&self) -> usize {
        lock(&self.log).len()
    }

    /// Empty the log.
    pub fn clear_log(&self) {
        lock(&self.log).clear();
        self.publish(TerminalEvent::Cleared);
    }

    // ── Metrics ─────────────────────────────────────────────────────────

    /// Set one gauge. Derived gauges are ignored.
    pub fn set_metric(&self, kind: GaugeKind, value: f64) {
        self.set_metrics(&[(kind, value)]);
    }

    /// Set several gauges and publish a single change event.
    pub fn set_metrics(&self, values: &[(GaugeKind, f64)]) {
        for &(kind, value) in values {
            if kind.is_derived() {
                tracing::debug!(gauge = kind.label(), "ignoring write to derived gauge");
                continue;
            }
            self.metrics.set(kind, value);
        }
        self.publish(TerminalEvent::MetricsChanged(self.metrics()));
    }

    /// Add deltas to several gauges and publish a single change event.
    pub fn nudge_metrics(&self, deltas: &[(GaugeKind, f64)]) {
        for &(kind, delta) in deltas {
            if !kind.is_derived() {
                self.metrics.nudge(kind, delta);
            }
        }
        self.publish(TerminalEvent::MetricsChanged(self.metrics()));
    }

    /// Current gauge values. `Ops Async` always equals the active operation count.
    pub fn metrics(&self) -> MetricSnapshot {
        let ops = lock(&self.active_ops);
        let mut snapshot = self.metrics.snapshot();
        for gauge in &mut snapshot.gauges {
            if gauge.kind == GaugeKind::AsyncOps {
                gauge.value = (ops.len() as f64).min(gauge.max);
            }
        }
        snapshot
    }

    pub fn metric(&self, kind: GaugeKind) -> f64 {
        self.metrics().value(kind)
    }

    // ── Operations and counters ─────────────────────────────────────────

    /// Register a new in-flight operation.
    pub fn begin_operation(&self) -> OperationId {
        let id = OperationId(self.next_op.fetch_add(1, Ordering::Relaxed));
        {
            let mut ops = lock(&self.active_ops);
            ops.insert(id);
            self.metrics.set(GaugeKind::AsyncOps, ops.len() as f64);
        }
        self.publish_operation_change();
        id
    }

    /// Remove a finished operation, whatever its outcome.
    pub fn end_operation(&self, id: OperationId) {
        {
            let mut ops = lock(&self.active_ops);
            ops.remove(&id);
            self.metrics.set(GaugeKind::AsyncOps, ops.len() as f64);
        }
        self.publish_operation_change();
    }

    fn publish_operation_change(&self) {
        self.publish(TerminalEvent::MetricsChanged(self.metrics()));
        self.publish(TerminalEvent::CountersChanged(self.counters()));
    }

    pub fn active_operations(&self) -> usize {
        lock(&self.active_ops).len()
    }

    /// Count one completed operation as succeeded or failed.
    pub fn record_outcome(&self, succeeded: bool) {
        if succeeded {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.publish(TerminalEvent::CountersChanged(self.counters()));
    }

    pub fn counters(&self) -> Counters {
        Counters {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            active: self.active_operations() as u64,
        }
    }

    // ── Uptime ──────────────────────────────────────────────────────────

    /// Advance the uptime clock by one second.
    pub fn advance_uptime(&self) -> u64 {
        let uptime_secs = self.uptime_secs.fetch_add(1, Ordering::Relaxed) + 1;
        self.publish(TerminalEvent::Tick { uptime_secs });
        uptime_secs
    }

    pub fn uptime_secs(&self) -> u64 {
        self.uptime_secs.load(Ordering::Relaxed)
    }

    pub(crate) fn publish_busy(&self, busy: bool) {
        self.publish(TerminalEvent::BusyChanged(busy));
    }
}

/// Lock a mutex, recovering the data if a panicking holder poisoned it.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
