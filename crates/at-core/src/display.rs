//! Dashboard view model folded from session events.

use at_protocol::{Counters, Gauge, GaugeKind, LogLine, MetricSnapshot, TerminalEvent};

/// Current dashboard status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardStatus {
    Idle,
    Processing,
}

/// Latest visible state of a session, rebuilt purely from `TerminalEvent`s.
pub struct Dashboard {
    pub lines: Vec<LogLine>,
    pub metrics: MetricSnapshot,
    pub counters: Counters,
    pub status: DashboardStatus,
    pub uptime_secs: u64,
    /// Events missed because the subscriber fell behind.
    pub missed_events: u64,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            metrics: initial_metrics(),
            counters: Counters::default(),
            status: DashboardStatus::Idle,
            uptime_secs: 0,
            missed_events: 0,
        }
    }

    /// Handle a session event, updating internal state.
    pub fn handle_event(&mut self, event: &TerminalEvent) {
        match event {
            TerminalEvent::LineAppended(line) => self.lines.push(line.clone()),
            TerminalEvent::Cleared => self.lines.clear(),
            TerminalEvent::MetricsChanged(snapshot) => self.metrics = snapshot.clone(),
            TerminalEvent::CountersChanged(counters) => self.counters = *counters,
            TerminalEvent::BusyChanged(true) => self.status = DashboardStatus::Processing,
            TerminalEvent::BusyChanged(false) => self.status = DashboardStatus::Idle,
            TerminalEvent::Tick { uptime_secs } => self.uptime_secs = *uptime_secs,
        }
    }

    pub fn record_lag(&mut self, skipped: u64) {
        self.missed_events += skipped;
    }

    pub fn is_processing(&self) -> bool {
        self.status == DashboardStatus::Processing
    }
}

fn initial_metrics() -> MetricSnapshot {
    MetricSnapshot {
        gauges: GaugeKind::ALL
            .iter()
            .map(|&kind| Gauge {
                kind,
                value: kind.initial(),
                max: kind.max(),
            })
            .collect(),
    }
}
