//! Non-interactive batch mode.
//!
//! Runs a list of commands one after another, prints every log line to
//! stdout (plain text or JSON Lines) and progress to stderr, then exits.
//! No ticker, no prompt, no quick actions.

use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Instant;

use at_protocol::{LogLine, TerminalEvent};
use at_sim::{Dice, RandomDice};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::config::Config;
use crate::interpreter::{Interpreter, InterpreterSettings, Submission};
use crate::session::Session;

/// Encapsulates all stderr formatting for batch mode output.
///
/// TTY output overwrites the current command line between persistent
/// boundaries. Non-TTY output is plain text, one line per event.
pub struct BatchOutput<W: Write> {
    writer: W,
    is_tty: bool,
    start_time: Instant,
    total: usize,
    completed: usize,
    failed: usize,
    term_width: u16,
}

impl<W: Write> BatchOutput<W> {
    pub fn new(writer: W, is_tty: bool, total: usize) -> Self {
        let term_width = if is_tty {
            crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80)
        } else {
            80
        };

        Self {
            writer,
            is_tty,
            start_time: Instant::now(),
            total,
            completed: 0,
            failed: 0,
            term_width,
        }
    }

    fn prefix(&self) -> &'static str {
        "[at:batch]"
    }

    fn colored_prefix(&self) -> String {
        if self.is_tty {
            format!("\x1b[2m\x1b[36m{}\x1b[0m", self.prefix())
        } else {
            self.prefix().to_string()
        }
    }

    fn truncate_to_width(&self, s: &str) -> String {
        let prefix_len = self.prefix().len() + 1;
        let max_content = (self.term_width as usize).saturating_sub(prefix_len + 8);
        if s.chars().count() > max_content && max_content > 3 {
            let mut truncated: String = s.chars().take(max_content - 3).collect();
            truncated.push_str("...");
            truncated
        } else {
            s.to_string()
        }
    }

    /// Emit the start boundary line (persists).
    pub fn emit_start(&mut self) {
        if self.is_tty {
            let _ = writeln!(
                self.writer,
                "{} \x1b[36m---\x1b[0m {} command(s)",
                self.colored_prefix(),
                self.total
            );
        } else {
            let _ = writeln!(self.writer, "{} --- {} command(s)", self.prefix(), self.total);
        }
    }

    /// Emit the command about to run (overwritten in TTY mode).
    pub fn emit_command(&mut self, index: usize, cmd: &str) {
        let display_cmd = self.truncate_to_width(cmd);
        if self.is_tty {
            let _ = write!(
                self.writer,
                "\r\x1b[K{} \x1b[2m({}/{}) {}\x1b[0m",
                self.colored_prefix(),
                index + 1,
                self.total,
                display_cmd,
            );
        } else {
            let _ = writeln!(
                self.writer,
                "{} ({}/{}) {}",
                self.prefix(),
                index + 1,
                self.total,
                display_cmd
            );
        }
        let _ = self.writer.flush();
    }

    /// Record how a command ended; failures persist in red.
    pub fn record(&mut self, cmd: &str, outcome: Submission) {
        match outcome {
            Submission::Completed | Submission::Ignored => self.completed += 1,
            Submission::Rejected | Submission::Aborted | Submission::Busy => {
                self.failed += 1;
                let reason = match outcome {
                    Submission::Rejected => "rejected",
                    Submission::Busy => "busy",
                    _ => "aborted",
                };
                let display_cmd = self.truncate_to_width(cmd);
                if self.is_tty {
                    let _ = writeln!(
                        self.writer,
                        "\r\x1b[K{} \x1b[31m{reason}: {display_cmd}\x1b[0m",
                        self.colored_prefix(),
                    );
                } else {
                    let _ = writeln!(self.writer, "{} {reason}: {display_cmd}", self.prefix());
                }
            }
        }
    }

    /// Emit an error (persists, red).
    pub fn emit_error(&mut self, msg: &str) {
        if self.is_tty {
            let _ = writeln!(
                self.writer,
                "\r\x1b[K{} \x1b[31merror: {}\x1b[0m",
                self.colored_prefix(),
                msg,
            );
        } else {
            let _ = writeln!(self.writer, "{} error: {}", self.prefix(), msg);
        }
    }

    /// Emit the done boundary line (persists).
    pub fn emit_done(&mut self) {
        let elapsed = self.start_time.elapsed().as_secs();
        if self.is_tty {
            let _ = writeln!(
                self.writer,
                "\r\x1b[K{} \x1b[36m---\x1b[0m \x1b[2mdone ({elapsed}s, {} ok, {} failed)\x1b[0m",
                self.colored_prefix(),
                self.completed,
                self.failed,
            );
        } else {
            let _ = writeln!(
                self.writer,
                "{} --- done ({elapsed}s, {} ok, {} failed)",
                self.prefix(),
                self.completed,
                self.failed,
            );
        }
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

/// How log lines are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    Text,
    /// One serialized `LogLine` per line.
    Json,
}

fn write_line<O: Write>(out: &mut O, line: &LogLine, format: LineFormat) -> std::io::Result<()> {
    match format {
        LineFormat::Text => writeln!(out, "{}", line.text),
        LineFormat::Json => {
            let json = serde_json::to_string(line).map_err(std::io::Error::other)?;
            writeln!(out, "{json}")
        }
    }
}

/// Forward every log line published since the last drain.
fn drain_lines<O: Write, E: Write>(
    events: &mut broadcast::Receiver<TerminalEvent>,
    out: &mut O,
    progress: &mut BatchOutput<E>,
    format: LineFormat,
) {
    loop {
        match events.try_recv() {
            Ok(TerminalEvent::LineAppended(line)) => {
                if let Err(e) = write_line(out, &line, format) {
                    progress.emit_error(&format!("stdout: {e}"));
                }
            }
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                progress.emit_error(&format!("{skipped} log line(s) dropped"));
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    let _ = out.flush();
}

/// Run `commands` in order against a fresh session with the given dice,
/// writing lines to `out` and progress to `err`. Returns the exit code.
pub async fn run_batch_with<O: Write, E: Write>(
    config: &Config,
    commands: &[String],
    format: LineFormat,
    dice: Arc<dyn Dice>,
    out: &mut O,
    progress: &mut BatchOutput<E>,
) -> i32 {
    let session = Arc::new(Session::new());
    let mut events = session.subscribe();
    let interpreter = Interpreter::new(
        Arc::clone(&session),
        dice,
        InterpreterSettings::from(&config.scenarios),
    );

    progress.emit_start();
    for (i, cmd) in commands.iter().enumerate() {
        progress.emit_command(i, cmd);
        let outcome = interpreter.submit(cmd).await;
        tracing::debug!(command = %cmd, ?outcome, "batch command finished");
        drain_lines(&mut events, out, progress, format);
        progress.record(cmd, outcome);
    }
    progress.emit_done();

    if progress.failed() > 0 {
        1
    } else {
        0
    }
}

/// Run commands non-interactively on stdout/stderr. Returns the exit code.
pub async fn run_batch(config: &Config, commands: &[String], format: LineFormat) -> i32 {
    let is_tty = std::io::stderr().is_terminal();
    let mut progress = BatchOutput::new(std::io::stderr(), is_tty, commands.len());
    let mut stdout = std::io::stdout().lock();
    run_batch_with(
        config,
        commands,
        format,
        Arc::new(RandomDice),
        &mut stdout,
        &mut progress,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_protocol::LineKind;
    use at_sim::ScriptedDice;

    fn make_output(is_tty: bool, total: usize) -> BatchOutput<Vec<u8>> {
        BatchOutput::new(Vec::new(), is_tty, total)
    }

    fn output_str(output: &BatchOutput<Vec<u8>>) -> String {
        String::from_utf8_lossy(&output.writer).to_string()
    }

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // --- TTY mode ---

    #[test]
    fn tty_start_has_ansi_and_boundary() {
        let mut out = make_output(true, 3);
        out.emit_start();
        let s = output_str(&out);
        assert!(s.contains("[at:batch]"));
        assert!(s.contains("---"));
        assert!(s.contains("3 command(s)"));
        assert!(s.contains("\x1b["), "TTY should have ANSI codes");
        assert!(s.ends_with('\n'));
    }

    #[test]
    fn tty_command_uses_carriage_return() {
        let mut out = make_output(true, 2);
        out.emit_command(1, "contar 3");
        let s = output_str(&out);
        assert!(s.starts_with("\r\x1b[K"));
        assert!(s.contains("(2/2)"));
        assert!(s.contains("contar 3"));
        assert!(!s.ends_with('\n'), "TTY command should be overwritable");
    }

    #[test]
    fn tty_failure_persists_red() {
        let mut out = make_output(true, 1);
        out.record("voar", Submission::Rejected);
        let s = output_str(&out);
        assert!(s.contains("\x1b[31m"));
        assert!(s.contains("rejected: voar"));
        assert!(s.ends_with('\n'));
        assert_eq!(out.failed(), 1);
    }

    // --- Non-TTY mode ---

    #[test]
    fn non_tty_has_no_ansi() {
        let mut out = make_output(false, 1);
        out.emit_start();
        out.emit_command(0, "servidor");
        out.record("servidor", Submission::Completed);
        out.emit_done();
        let s = output_str(&out);
        assert!(!s.contains("\x1b["));
        assert!(s.contains("[at:batch] (1/1) servidor\n"));
        assert!(s.contains("done (0s, 1 ok, 0 failed)"));
    }

    #[test]
    fn completed_commands_are_not_reported_individually() {
        let mut out = make_output(false, 1);
        out.record("ajuda", Submission::Completed);
        assert!(output_str(&out).is_empty());
        assert_eq!(out.failed(), 0);
    }

    #[test]
    fn long_commands_are_truncated() {
        let mut out = make_output(false, 1);
        let long = "x".repeat(200);
        out.emit_command(0, &long);
        let s = output_str(&out);
        assert!(s.contains("..."));
        assert!(s.len() < 120);
    }

    // --- Full runs ---

    #[tokio::test(start_paused = true)]
    async fn text_run_prints_lines_in_order() {
        let mut stdout = Vec::new();
        let mut progress = make_output(false, 2);
        let code = run_batch_with(
            &Config::default(),
            &commands(&["idade 25", "login admin 1234"]),
            LineFormat::Text,
            Arc::new(ScriptedDice::always_succeed()),
            &mut stdout,
            &mut progress,
        )
        .await;

        assert_eq!(code, 0);
        let text = String::from_utf8_lossy(&stdout);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "$ idade 25");
        assert!(lines.contains(&"$ login admin 1234"));
        assert!(output_str(&progress).contains("2 ok, 0 failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn json_run_emits_one_object_per_line() {
        let mut stdout = Vec::new();
        let mut progress = make_output(false, 1);
        let code = run_batch_with(
            &Config::default(),
            &commands(&["ajuda"]),
            LineFormat::Json,
            Arc::new(ScriptedDice::always_succeed()),
            &mut stdout,
            &mut progress,
        )
        .await;

        assert_eq!(code, 0);
        let text = String::from_utf8_lossy(&stdout);
        let parsed: Vec<LogLine> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed[0].text, "$ ajuda");
        assert_eq!(parsed[0].kind, LineKind::Input);
        assert!(parsed.len() > 2);
        assert!(text.lines().all(|l| l.contains("\"elapsed\"")));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_command_sets_exit_code() {
        let mut stdout = Vec::new();
        let mut progress = make_output(false, 2);
        let code = run_batch_with(
            &Config::default(),
            &commands(&["voar", "ajuda"]),
            LineFormat::Text,
            Arc::new(ScriptedDice::always_succeed()),
            &mut stdout,
            &mut progress,
        )
        .await;

        assert_eq!(code, 1);
        let s = output_str(&progress);
        assert!(s.contains("rejected: voar"));
        assert!(s.contains("1 ok, 1 failed"));
        let text = String::from_utf8_lossy(&stdout);
        assert!(text.contains("$ ajuda"), "later commands still run");
    }
}
