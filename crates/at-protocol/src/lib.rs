//! at-protocol: Shared types for AsyncTerm.
//!
//! This crate defines the data model exchanged between the command
//! interpreter, the simulation primitives, and the terminal front-ends.

pub mod line;
pub mod message;
pub mod metric;

pub use line::{LineKind, LogLine};
pub use message::TerminalEvent;
pub use metric::{Counters, Gauge, GaugeKind, MetricSnapshot};
