//! Command interpreter: busy gate, parsing, and top-level failure handling.
//!
//! One command runs at a time. While a command is in progress every other
//! submission is dropped without touching the session. Scenario errors and
//! panics are turned into a single generic error line; gauges written before
//! the failure keep their values.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use at_protocol::LineKind;
use at_sim::{Dice, TimeScale};
use futures::FutureExt;
use tracing::Instrument;

use crate::command::{parse, ParseError, ParseLimits};
use crate::config::ScenarioConfig;
use crate::scenarios::{self, ScenarioContext};
use crate::session::Session;

/// What happened to a submitted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The scenario ran to completion.
    Completed,
    /// The input did not parse; one error line was logged.
    Rejected,
    /// The scenario failed unexpectedly; one generic error line was logged.
    Aborted,
    /// Another command was in progress. Nothing changed.
    Busy,
    /// Blank input. Nothing changed.
    Ignored,
}

/// Tunables for scenario playback.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct InterpreterSettings {
    pub scale: TimeScale,
    pub limits: ParseLimits,
}

impl From<&ScenarioConfig> for InterpreterSettings {
    fn from(config: &ScenarioConfig) -> Self {
        Self {
            scale: TimeScale::new(config.time_scale),
            limits: ParseLimits {
                max_count: config.max_count.max(1),
            },
        }
    }
}

struct Inner {
    session: Arc<Session>,
    dice: Arc<dyn Dice>,
    settings: InterpreterSettings,
    processing: AtomicBool,
}

/// Cheaply cloneable handle; clones share the busy flag.
#[derive(Clone)]
pub struct Interpreter {
    inner: Arc<Inner>,
}

impl Interpreter {
    pub fn new(session: Arc<Session>, dice: Arc<dyn Dice>, settings: InterpreterSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                session,
                dice,
                settings,
                processing: AtomicBool::new(false),
            }),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    /// Whether a command is currently in progress.
    pub fn is_busy(&self) -> bool {
        self.inner.processing.load(Ordering::Acquire)
    }

    /// Run one command to completion, unless another is in progress.
    pub async fn submit(&self, raw: &str) -> Submission {
        let input = raw.trim();
        if input.is_empty() {
            return Submission::Ignored;
        }

        let Some(_guard) = BusyGuard::claim(&self.inner) else {
            tracing::debug!(input, "busy, dropping command");
            return Submission::Busy;
        };

        let session = &self.inner.session;
        session.emit(format!("$ {input}"), LineKind::Input);

        let command = match parse(input, self.inner.settings.limits) {
            Ok(command) => command,
            Err(e) => {
                tracing::info!(input, error = %e, "rejected command");
                session.emit(parse_error_line(&e), LineKind::Error);
                return Submission::Rejected;
            }
        };

        let ctx = ScenarioContext {
            session,
            dice: self.inner.dice.as_ref(),
            scale: self.inner.settings.scale,
        };
        let span = tracing::info_span!("scenario", command = %command);
        let outcome = AssertUnwindSafe(scenarios::run(&command, &ctx))
            .catch_unwind()
            .instrument(span)
            .await;

        match outcome {
            Ok(Ok(())) => {
                tracing::info!(%command, "scenario completed");
                Submission::Completed
            }
            Ok(Err(e)) => {
                tracing::warn!(%command, error = %e, "scenario failed");
                session.emit(format!("💥 Erro ao executar comando: {e}"), LineKind::Error);
                Submission::Aborted
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::error!(%command, panic = %msg, "scenario panicked");
                session.emit(format!("💥 Erro ao executar comando: {msg}"), LineKind::Error);
                Submission::Aborted
            }
        }
    }
}

fn parse_error_line(e: &ParseError) -> String {
    match e {
        ParseError::Unknown(_) => format!("❓ {e}"),
        ParseError::InvalidArgument { .. } => format!("⚠️ {e}"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "erro inesperado".to_string()
    }
}

/// Holds the processing flag; releases it on drop, including during unwinding.
struct BusyGuard<'a> {
    inner: &'a Inner,
}

impl<'a> BusyGuard<'a> {
    fn claim(inner: &'a Inner) -> Option<Self> {
        inner
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        inner.session.publish_busy(true);
        Some(Self { inner })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.inner.processing.store(false, Ordering::Release);
        self.inner.session.publish_busy(false);
    }
}
