//! Terminal styling helpers with NO_COLOR support.

/// Check if color output is enabled (respects `NO_COLOR` env var).
pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Terminal style helper that respects NO_COLOR.
pub struct Style {
    enabled: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

impl Style {
    pub fn new() -> Self {
        Self {
            enabled: color_enabled(),
        }
    }

    /// Create a style with colors explicitly enabled (for tests).
    pub fn force_enabled() -> Self {
        Self { enabled: true }
    }

    /// Create a style with colors explicitly disabled.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn dim_start(&self) -> &'static str {
        if self.enabled {
            "\x1b[2m"
        } else {
            ""
        }
    }

    pub fn bold_start(&self) -> &'static str {
        if self.enabled {
            "\x1b[1m"
        } else {
            ""
        }
    }

    pub fn red_start(&self) -> &'static str {
        if self.enabled {
            "\x1b[31m"
        } else {
            ""
        }
    }

    pub fn yellow_start(&self) -> &'static str {
        if self.enabled {
            "\x1b[33m"
        } else {
            ""
        }
    }

    pub fn green_start(&self) -> &'static str {
        if self.enabled {
            "\x1b[32m"
        } else {
            ""
        }
    }

    pub fn cyan_start(&self) -> &'static str {
        if self.enabled {
            "\x1b[36m"
        } else {
            ""
        }
    }

    pub fn blue_start(&self) -> &'static str {
        if self.enabled {
            "\x1b[34m"
        } else {
            ""
        }
    }

    /// Erase the screen and home the cursor. Empty without color.
    pub fn clear_screen(&self) -> &'static str {
        if self.enabled {
            "\x1b[2J\x1b[H"
        } else {
            ""
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn reset(&self) -> &'static str {
        if self.enabled {
            "\x1b[0m"
        } else {
            ""
        }
    }
}

/// Compute visible width of a string, ignoring ANSI escape sequences.
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
        } else {
            width += unicode_display_width(c);
        }
    }
    width
}

/// Approximate display width of a character.
/// CJK characters and some symbols are double-width.
fn unicode_display_width(c: char) -> usize {
    // Control characters have zero width
    if c < ' ' {
        return 0;
    }
    // ASCII is single-width
    if c.is_ascii() {
        return 1;
    }
    // CJK Unified Ideographs and common double-width ranges
    let cp = c as u32;
    if (0x1100..=0x115F).contains(&cp)       // Hangul Jamo
        || (0x2E80..=0x303E).contains(&cp)   // CJK Radicals
        || (0x3040..=0x33BF).contains(&cp)   // Hiragana, Katakana, CJK
        || (0x3400..=0x4DBF).contains(&cp)   // CJK Extension A
        || (0x4E00..=0x9FFF).contains(&cp)   // CJK Unified
        || (0xF900..=0xFAFF).contains(&cp)   // CJK Compatibility
        || (0xFE30..=0xFE6F).contains(&cp)   // CJK Compatibility Forms
        || (0xFF01..=0xFF60).contains(&cp)    // Fullwidth Forms
        || (0x20000..=0x2FFFF).contains(&cp)
    // CJK Extension B+
    {
        2
    } else {
        1
    }
}

/// Format an uptime in seconds as `m:ss`.
pub fn format_uptime(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Render a filled bar for a percentage, `width` cells wide.
pub fn gauge_bar(percent: f64, width: usize) -> String {
    let pct = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let filled = ((pct / 100.0) * width as f64).round() as usize;
    let mut bar = String::with_capacity(width * 3);
    for i in 0..width {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar
}

/// Pad `s` with spaces to `width` visible columns.
pub fn pad_visible(s: &str, width: usize) -> String {
    let w = visible_width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_disabled_returns_empty_codes() {
        let style = Style::disabled();
        assert_eq!(style.dim_start(), "");
        assert_eq!(style.bold_start(), "");
        assert_eq!(style.red_start(), "");
        assert_eq!(style.yellow_start(), "");
        assert_eq!(style.green_start(), "");
        assert_eq!(style.cyan_start(), "");
        assert_eq!(style.reset(), "");
    }

    #[test]
    fn color_enabled_returns_escape_codes() {
        let style = Style::force_enabled();
        assert_eq!(style.dim_start(), "\x1b[2m");
        assert_eq!(style.reset(), "\x1b[0m");
        assert_eq!(style.red_start(), "\x1b[31m");
    }

    #[test]
    fn visible_width_plain_text() {
        assert_eq!(visible_width("hello"), 5);
    }

    #[test]
    fn visible_width_strips_ansi() {
        assert_eq!(visible_width("\x1b[31mRede\x1b[0m"), 4);
    }

    #[test]
    fn visible_width_multibyte_utf8() {
        assert_eq!(visible_width("✓ 3  ✗ 1"), 8);
    }

    #[test]
    fn visible_width_empty() {
        assert_eq!(visible_width(""), 0);
    }

    #[test]
    fn visible_width_accented() {
        assert_eq!(visible_width("Memória"), 7);
    }

    #[test]
    fn blue_and_clear_follow_enabled() {
        assert_eq!(Style::force_enabled().blue_start(), "\x1b[34m");
        assert_eq!(Style::disabled().blue_start(), "");
        assert_eq!(Style::disabled().clear_screen(), "");
        assert!(Style::force_enabled().is_enabled());
    }

    #[test]
    fn format_uptime_minutes_seconds() {
        assert_eq!(format_uptime(0), "0:00");
        assert_eq!(format_uptime(65), "1:05");
        assert_eq!(format_uptime(600), "10:00");
    }

    #[test]
    fn gauge_bar_fills_proportionally() {
        assert_eq!(gauge_bar(50.0, 10), "█████░░░░░");
        assert_eq!(gauge_bar(0.0, 4), "░░░░");
        assert_eq!(gauge_bar(100.0, 4), "████");
    }

    #[test]
    fn gauge_bar_clamps() {
        assert_eq!(gauge_bar(250.0, 4), "████");
        assert_eq!(gauge_bar(-3.0, 4), "░░░░");
        assert_eq!(gauge_bar(f64::NAN, 2), "░░");
    }

    #[test]
    fn pad_visible_counts_columns() {
        assert_eq!(pad_visible("CPU", 6), "CPU   ");
        assert_eq!(pad_visible("Memória", 9), "Memória  ");
        assert_eq!(pad_visible("Ops Async", 3), "Ops Async");
    }
}
