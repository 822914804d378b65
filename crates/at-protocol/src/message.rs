//! Events published by a terminal session.

use crate::line::LogLine;
use crate::metric::{Counters, MetricSnapshot};

/// Change notifications for rendering surfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalEvent {
    /// A line was appended to the log.
    LineAppended(LogLine),

    /// The log was emptied.
    Cleared,

    /// One or more gauges changed.
    MetricsChanged(MetricSnapshot),

    /// Outcome or active-operation counts changed.
    CountersChanged(Counters),

    /// The interpreter started or finished a command.
    BusyChanged(bool),

    /// Periodic heartbeat carrying session uptime.
    Tick { uptime_secs: u64 },
}
