//! Interactive terminal: prompt, quick actions, live log and gauges.
//!
//! Stdin lines and session events are multiplexed on one task. Commands run
//! on spawned tasks so the loop keeps rendering while a scenario plays.
//! Lines typed while a command is in progress are dropped.

use std::io::{self, Write};
use std::sync::Arc;

use at_protocol::TerminalEvent;
use at_sim::{Dice, RandomDice};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::display::Dashboard;
use crate::interpreter::{Interpreter, InterpreterSettings, Submission};
use crate::metrics::MetricTicker;
use crate::renderer::TerminalRenderer;
use crate::session::Session;
use crate::style::Style;

/// A preset command bound to `:<key>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub key: char,
    pub label: &'static str,
    pub command: &'static str,
}

pub const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        key: '1',
        label: "Teste Servidor",
        command: "servidor",
    },
    QuickAction {
        key: '2',
        label: "Verificar Idade",
        command: "idade 25",
    },
    QuickAction {
        key: '3',
        label: "Download",
        command: "download",
    },
    QuickAction {
        key: '4',
        label: "Login",
        command: "login admin 1234",
    },
    QuickAction {
        key: '5',
        label: "Contar",
        command: "contar 5",
    },
    QuickAction {
        key: '6',
        label: "Corrida",
        command: "corrida",
    },
];

/// A line typed at the prompt, after front-end meta commands are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplInput<'a> {
    Empty,
    Quit,
    Status,
    QuickList,
    /// Text for the interpreter.
    Command(&'a str),
    UnknownMeta(&'a str),
}

/// Resolve meta commands (`:q`, `:status`, `:quick`, `:1`..`:6`).
/// Anything not starting with `:` goes to the interpreter untouched.
pub fn classify_input(raw: &str) -> ReplInput<'_> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ReplInput::Empty;
    }
    let Some(meta) = trimmed.strip_prefix(':') else {
        return ReplInput::Command(trimmed);
    };
    match meta.trim() {
        "q" | "quit" => ReplInput::Quit,
        "status" => ReplInput::Status,
        "quick" => ReplInput::QuickList,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(key), None) => quick_action(key)
                    .map(|a| ReplInput::Command(a.command))
                    .unwrap_or(ReplInput::UnknownMeta(trimmed)),
                _ => ReplInput::UnknownMeta(trimmed),
            }
        }
    }
}

pub fn quick_action(key: char) -> Option<&'static QuickAction> {
    QUICK_ACTIONS.iter().find(|a| a.key == key)
}

/// Apply one session event to the screen.
pub fn render_event<W: Write>(
    renderer: &mut TerminalRenderer<W>,
    dashboard: &Dashboard,
    event: &TerminalEvent,
    footer: bool,
) {
    match event {
        TerminalEvent::LineAppended(line) => {
            renderer.emit_line(line);
            if dashboard.is_processing() {
                renderer.emit_processing_with(&dashboard.metrics);
            }
        }
        TerminalEvent::Cleared => renderer.emit_cleared(),
        TerminalEvent::BusyChanged(true) => renderer.emit_processing_with(&dashboard.metrics),
        TerminalEvent::BusyChanged(false) => {
            if footer {
                renderer.emit_footer(dashboard);
            }
            renderer.emit_prompt();
        }
        // Gauges refresh in place while a command runs; idle changes wait
        // for the next footer or `:status`.
        TerminalEvent::MetricsChanged(_) if dashboard.is_processing() => {
            renderer.emit_processing_with(&dashboard.metrics);
        }
        TerminalEvent::MetricsChanged(_)
        | TerminalEvent::CountersChanged(_)
        | TerminalEvent::Tick { .. } => {}
    }
}

/// Run the interactive terminal until `:q`, EOF or Ctrl-C.
pub async fn run_repl(config: &Config) -> io::Result<()> {
    let session = Arc::new(Session::new());
    let dice: Arc<dyn Dice> = Arc::new(RandomDice);
    let interpreter = Interpreter::new(
        Arc::clone(&session),
        Arc::clone(&dice),
        InterpreterSettings::from(&config.scenarios),
    );
    let ticker = MetricTicker::spawn(Arc::clone(&session), dice, &config.metrics);

    let mut events = session.subscribe();
    let mut renderer = TerminalRenderer::new(io::stdout(), Style::new(), config.display.timestamps);
    let mut dashboard = Dashboard::new();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut running: JoinSet<Submission> = JoinSet::new();
    let mut stdin_open = true;

    renderer.emit_banner();
    renderer.emit_prompt();

    loop {
        tokio::select! {
            line = stdin.next_line(), if stdin_open => {
                let Some(raw) = line? else {
                    stdin_open = false;
                    if running.is_empty() {
                        break;
                    }
                    continue;
                };
                match classify_input(&raw) {
                    ReplInput::Empty => renderer.emit_prompt(),
                    ReplInput::Quit => break,
                    ReplInput::Status => {
                        renderer.emit_status(&dashboard);
                        renderer.emit_prompt();
                    }
                    ReplInput::QuickList => {
                        renderer.emit_quick_actions(QUICK_ACTIONS);
                        renderer.emit_prompt();
                    }
                    ReplInput::UnknownMeta(meta) => {
                        renderer.emit_hint(&format!(
                            "meta comando desconhecido: {meta} (use :status, :quick, :1..:6 ou :q)"
                        ));
                        renderer.emit_prompt();
                    }
                    ReplInput::Command(cmd) => {
                        if interpreter.is_busy() {
                            tracing::debug!(command = cmd, "busy, input dropped");
                            renderer.emit_processing_with(&dashboard.metrics);
                        } else {
                            let interp = interpreter.clone();
                            let cmd = cmd.to_string();
                            running.spawn(async move { interp.submit(&cmd).await });
                        }
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        dashboard.handle_event(&event);
                        render_event(&mut renderer, &dashboard, &event, config.display.footer);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "renderer fell behind session events");
                        dashboard.record_lag(skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            Some(done) = running.join_next(), if !running.is_empty() => {
                match done {
                    Ok(outcome) => tracing::debug!(?outcome, "command finished"),
                    Err(e) => tracing::error!(error = %e, "command task failed"),
                }
                if !stdin_open && running.is_empty() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                renderer.clear_indicator();
                break;
            }
        }
    }

    // Flush whatever the last command published before leaving.
    while let Ok(event) = events.try_recv() {
        dashboard.handle_event(&event);
        if let TerminalEvent::LineAppended(line) = &event {
            renderer.emit_line(line);
        }
    }
    running.abort_all();
    ticker.stop();
    renderer.clear_indicator();
    let _ = writeln!(renderer.writer);
    Ok(())
}
