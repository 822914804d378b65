//! Terminal output for the interactive and batch front-ends.
//!
//! `TerminalRenderer<W: Write>` centralizes all formatting. The "processing"
//! indicator is an overwritable line; every persistent emit method clears it
//! first so log lines never land on top of it.

use std::io::Write;

use at_protocol::{Counters, LineKind, LogLine, MetricSnapshot};
use chrono::Local;

use crate::display::Dashboard;
use crate::repl::QuickAction;
use crate::style::{format_uptime, gauge_bar, pad_visible, Style};

const LABEL_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 30;

pub struct TerminalRenderer<W: Write> {
    pub writer: W,
    style: Style,
    term_width: u16,
    timestamps: bool,
    indicator_active: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(writer: W, style: Style, timestamps: bool) -> Self {
        let term_width = crossterm::terminal::size().map(|(w, _)| w).unwrap_or(80);
        Self::new_with_width(writer, style, timestamps, term_width)
    }

    pub fn new_with_width(writer: W, style: Style, timestamps: bool, width: u16) -> Self {
        Self {
            writer,
            style,
            term_width: width,
            timestamps,
            indicator_active: false,
        }
    }

    // ── Processing indicator ────────────────────────────────────────────

    /// Clear the processing indicator if one is shown.
    pub fn clear_indicator(&mut self) {
        if self.indicator_active {
            let _ = write!(self.writer, "\r\x1b[K");
            self.indicator_active = false;
        }
    }

    /// Show `⟳ Processando...` on the current line until the next emit.
    pub fn emit_processing(&mut self) {
        self.write_indicator("");
    }

    /// Processing indicator followed by the live gauge summary.
    pub fn emit_processing_with(&mut self, metrics: &MetricSnapshot) {
        let summary = format!("  {}", gauge_summary(metrics));
        self.write_indicator(&summary);
    }

    fn write_indicator(&mut self, suffix: &str) {
        let _ = write!(
            self.writer,
            "\r\x1b[K{}⟳ Processando...{}{}{suffix}{}",
            self.style.cyan_start(),
            self.style.reset(),
            self.style.dim_start(),
            self.style.reset()
        );
        let _ = self.writer.flush();
        self.indicator_active = true;
    }

    pub fn indicator_active(&self) -> bool {
        self.indicator_active
    }

    // ── Persistent output ───────────────────────────────────────────────

    pub fn emit_banner(&mut self) {
        self.clear_indicator();
        let _ = writeln!(
            self.writer,
            "{}Bem-vindo ao Terminal de Operações Async v2.0{}",
            self.style.bold_start(),
            self.style.reset()
        );
        let _ = writeln!(
            self.writer,
            "{}Digite 'ajuda' para ver os comandos disponíveis, ':quick' para os atalhos ou ':q' para sair.{}",
            self.style.dim_start(),
            self.style.reset()
        );
    }

    /// Write one log line, colored by kind.
    pub fn emit_line(&mut self, line: &LogLine) {
        self.clear_indicator();
        let color = kind_color(line.kind, &self.style);
        let stamp = if self.timestamps {
            format!(
                "{}[{}]{} ",
                self.style.dim_start(),
                line.timestamp.with_timezone(&Local).format("%H:%M:%S"),
                self.style.reset()
            )
        } else {
            String::new()
        };
        let _ = writeln!(
            self.writer,
            "{stamp}{color}{}{}",
            line.text,
            self.style.reset()
        );
        let _ = self.writer.flush();
    }

    /// The log was emptied: wipe the screen, or mark the break when colors are off.
    pub fn emit_cleared(&mut self) {
        self.clear_indicator();
        if self.style.is_enabled() {
            let _ = write!(self.writer, "{}", self.style.clear_screen());
        } else {
            let _ = writeln!(self.writer, "--- terminal limpo ---");
        }
        let _ = self.writer.flush();
    }

    /// One bar per gauge: `CPU        [██████░░░░]  60%`
    pub fn emit_gauges(&mut self, metrics: &MetricSnapshot) {
        self.clear_indicator();
        let bar_width = (self.term_width as usize)
            .saturating_sub(LABEL_WIDTH + 10)
            .clamp(5, MAX_BAR_WIDTH);
        for gauge in &metrics.gauges {
            let pct = gauge.percent();
            let _ = writeln!(
                self.writer,
                "{} {}[{}]{} {:>3.0}%",
                pad_visible(gauge.kind.label(), LABEL_WIDTH),
                gauge_color(pct, &self.style),
                gauge_bar(pct, bar_width),
                self.style.reset(),
                pct
            );
        }
    }

    /// Footer after each command: gauge summary, then counters and uptime.
    ///
    /// `CPU 15%  Memória 32%  Rede 8%  Ops Async 0%  │  ✓ 3  ✗ 1  ⟳ 0  up 1:05`
    pub fn emit_footer(&mut self, dashboard: &Dashboard) {
        self.clear_indicator();
        let counters = self.counters_line(&dashboard.counters, dashboard.uptime_secs);
        let _ = writeln!(
            self.writer,
            "{}{}  │{}  {counters}",
            self.style.dim_start(),
            gauge_summary(&dashboard.metrics),
            self.style.reset(),
        );
        let _ = self.writer.flush();
    }

    /// `✓ 3  ✗ 1  ⟳ 0  up 1:05`
    fn counters_line(&self, counters: &Counters, uptime_secs: u64) -> String {
        format!(
            "{}✓ {}{}  {}✗ {}{}  {}⟳ {}{}  {}up {}{}",
            self.style.green_start(),
            counters.succeeded,
            self.style.reset(),
            self.style.red_start(),
            counters.failed,
            self.style.reset(),
            self.style.yellow_start(),
            counters.active,
            self.style.reset(),
            self.style.dim_start(),
            format_uptime(uptime_secs),
            self.style.reset(),
        )
    }

    /// Full status view: header, gauges, counters.
    pub fn emit_status(&mut self, dashboard: &Dashboard) {
        self.clear_indicator();
        let state = if dashboard.is_processing() {
            "PROCESSANDO"
        } else {
            "SISTEMA ONLINE"
        };
        let _ = writeln!(
            self.writer,
            "{}● {state}{}  TEMPO ATIVO: {}  linhas: {}",
            self.style.green_start(),
            self.style.reset(),
            format_uptime(dashboard.uptime_secs),
            dashboard.lines.len(),
        );
        self.emit_gauges(&dashboard.metrics);
        let counters = self.counters_line(&dashboard.counters, dashboard.uptime_secs);
        let _ = writeln!(self.writer, "{counters}");
        let _ = self.writer.flush();
    }

    pub fn emit_quick_actions(&mut self, actions: &[QuickAction]) {
        self.clear_indicator();
        let _ = writeln!(self.writer, "Comandos rápidos:");
        for action in actions {
            let _ = writeln!(
                self.writer,
                "  {}:{}{}  {:<16} {}{}{}",
                self.style.bold_start(),
                action.key,
                self.style.reset(),
                action.label,
                self.style.dim_start(),
                action.command,
                self.style.reset(),
            );
        }
        let _ = self.writer.flush();
    }

    pub fn emit_prompt(&mut self) {
        self.clear_indicator();
        let _ = write!(
            self.writer,
            "{}❯{} ",
            self.style.green_start(),
            self.style.reset()
        );
        let _ = self.writer.flush();
    }

    /// Dim one-line hint for front-end messages that are not log lines.
    pub fn emit_hint(&mut self, msg: &str) {
        self.clear_indicator();
        let _ = writeln!(
            self.writer,
            "{}{}{}",
            self.style.dim_start(),
            msg,
            self.style.reset()
        );
        let _ = self.writer.flush();
    }

    /// Show an error: `[at] error: msg`
    pub fn emit_error(&mut self, msg: &str) {
        self.clear_indicator();
        let _ = writeln!(
            self.writer,
            "{}[at] error: {msg}{}",
            self.style.red_start(),
            self.style.reset()
        );
        let _ = self.writer.flush();
    }
}

/// Color for a log line kind.
pub fn kind_color(kind: LineKind, style: &Style) -> &'static str {
    match kind {
        LineKind::Input | LineKind::Success => style.green_start(),
        LineKind::Error => style.red_start(),
        LineKind::Warning => style.yellow_start(),
        LineKind::Info => style.blue_start(),
        LineKind::Output => "",
    }
}

/// One-line gauge readout: `CPU 60%  Memória 32%  Rede 80%  Ops Async 10%`
pub fn gauge_summary(metrics: &MetricSnapshot) -> String {
    metrics
        .gauges
        .iter()
        .map(|g| format!("{} {:.0}%", g.kind.label(), g.percent()))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Gauge bars go yellow above 60% and red above 85%.
fn gauge_color(percent: f64, style: &Style) -> &'static str {
    if percent > 85.0 {
        style.red_start()
    } else if percent > 60.0 {
        style.yellow_start()
    } else {
        style.green_start()
    }
}
