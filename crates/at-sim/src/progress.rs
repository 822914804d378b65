//! Progress streams for simulated operations.
//!
//! A simulated operation is a fixed delay split into ten equal steps. The
//! stream reports the start, a progress checkpoint every 30%, and completion.
//! Deciding success or failure is left to the caller.

use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use tokio::time::sleep;

use crate::timer::TimeScale;

const STEPS: u32 = 10;
const REPORT_EVERY_PCT: u32 = 30;

/// Parameters of one simulated operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub name: String,
    pub duration: Duration,
    /// Chance of success in `[0, 1]`.
    pub success_rate: f64,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, duration_ms: u64, success_rate: f64) -> Self {
        Self {
            name: name.into(),
            duration: Duration::from_millis(duration_ms),
            success_rate,
        }
    }
}

/// Milestones emitted while an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started,
    /// Percentage reached, reported before the step's delay.
    Progress(u32),
    /// The full duration has elapsed.
    Completed,
}

/// Create a stream of milestones for one operation.
pub fn operation_progress(
    spec: &OperationSpec,
    scale: TimeScale,
) -> impl Stream<Item = ProgressEvent> {
    let step = scale.apply(spec.duration) / STEPS;

    stream! {
        yield ProgressEvent::Started;

        for i in 0..STEPS {
            let pct = i * 100 / STEPS;
            if pct % REPORT_EVERY_PCT == 0 {
                yield ProgressEvent::Progress(pct);
            }
            sleep(step).await;
        }

        yield ProgressEvent::Completed;
    }
}
