//! Diagnostic logging to stderr.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;

/// Build the filter: `RUST_LOG` wins, else the configured filter, else `warn`.
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(config: &LogConfig) {
    let _ = fmt()
        .with_env_filter(build_filter(config))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn configured_filter_is_used() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = build_filter(&LogConfig {
            filter: "debug".to_string(),
        });
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn invalid_filter_falls_back_to_warn() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = build_filter(&LogConfig {
            filter: "at_core=[".to_string(),
        });
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing(&LogConfig::default());
        init_tracing(&LogConfig::default());
    }
}
