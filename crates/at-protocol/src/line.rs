//! Terminal log lines.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a log line, used for coloring and filtering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Echo of a submitted command.
    Input,
    Output,
    Success,
    Error,
    Info,
    Warning,
}

impl LineKind {
    pub fn label(self) -> &'static str {
        match self {
            LineKind::Input => "input",
            LineKind::Output => "output",
            LineKind::Success => "success",
            LineKind::Error => "error",
            LineKind::Info => "info",
            LineKind::Warning => "warning",
        }
    }
}

/// A single immutable line in the terminal log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogLine {
    pub id: Uuid,
    pub text: String,
    pub kind: LineKind,
    pub timestamp: DateTime<Utc>,
    /// Monotonic offset from the start of the session.
    #[serde(with = "elapsed_ms")]
    pub elapsed: Duration,
    pub animated: bool,
}

impl LogLine {
    pub fn new(text: impl Into<String>, kind: LineKind, elapsed: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            kind,
            timestamp: Utc::now(),
            elapsed,
            animated: true,
        }
    }

    pub fn with_animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }
}

/// Serialize `Duration` as whole milliseconds.
mod elapsed_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
