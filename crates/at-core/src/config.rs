use at_sim::TimeScale;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub scenarios: ScenarioConfig,
    pub metrics: MetricsConfig,
    pub display: DisplayConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Multiplier for every simulated delay. `0.1` plays scenarios ten times faster.
    pub time_scale: f64,
    /// Largest accepted argument for `contar`.
    pub max_count: u32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_count: 20,
        }
    }
}

impl ScenarioConfig {
    /// Multiply the time scale by `factor`, after normalizing the configured
    /// value the same way playback does.
    pub fn speed_up(&mut self, factor: f64) {
        self.time_scale = TimeScale::new(self.time_scale).factor() * factor;
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Interval of the gauge random walk and uptime clock.
    pub tick_interval_ms: u64,
    /// Largest step of the random walk, split evenly around zero.
    pub walk_amplitude: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            walk_amplitude: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Prefix log lines with their wall-clock time.
    pub timestamps: bool,
    /// Print a status footer after every command.
    pub footer: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamps: true,
            footer: true,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn load_or_default() -> Self {
        Self::load_from(&config_path())
    }

    /// Read a config file, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("warning: failed to parse {}: {e}", path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }
}

fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("asyncterm").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.scenarios.time_scale, 1.0);
        assert_eq!(cfg.scenarios.max_count, 20);
        assert_eq!(cfg.metrics.tick_interval_ms, 1000);
        assert_eq!(cfg.metrics.walk_amplitude, 10.0);
        assert!(cfg.display.timestamps);
        assert_eq!(cfg.log.filter, "warn");
    }

    #[test]
    fn speed_up_scales_configured_value() {
        let mut cfg = ScenarioConfig {
            time_scale: 0.5,
            max_count: 20,
        };
        cfg.speed_up(0.1);
        assert!((cfg.time_scale - 0.05).abs() < 1e-12);
    }

    #[test]
    fn speed_up_normalizes_invalid_scale_first() {
        let mut cfg = ScenarioConfig {
            time_scale: -2.0,
            max_count: 20,
        };
        cfg.speed_up(0.1);
        assert!((cfg.time_scale - 0.1).abs() < 1e-12);
        assert_eq!(TimeScale::new(cfg.time_scale).factor(), cfg.time_scale);
    }

    #[test]
    fn parse_empty_toml() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn parse_scenarios_section() {
        let toml_str = r#"
[scenarios]
time_scale = 0.25
max_count = 8
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.scenarios.time_scale, 0.25);
        assert_eq!(cfg.scenarios.max_count, 8);
        assert_eq!(cfg.metrics, MetricsConfig::default());
    }

    #[test]
    fn parse_partial_metrics_section() {
        let toml_str = r#"
[metrics]
walk_amplitude = 4.0
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.metrics.walk_amplitude, 4.0);
        assert_eq!(cfg.metrics.tick_interval_ms, 1000);
    }

    #[test]
    fn parse_display_and_log() {
        let toml_str = r#"
[display]
timestamps = false
footer = false

[log]
filter = "at_core=debug"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert!(!cfg.display.timestamps);
        assert!(!cfg.display.footer);
        assert_eq!(cfg.log.filter, "at_core=debug");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scenarios]\ntime_scale = 0.5").unwrap();

        let cfg = Config::load_from(file.path());
        assert_eq!(cfg.scenarios.time_scale, 0.5);
    }

    #[test]
    fn load_from_invalid_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scenarios\ntime_scale = ").unwrap();

        let cfg = Config::load_from(file.path());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(cfg, Config::default());
    }
}
