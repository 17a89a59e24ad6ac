//! Structured logging for the mp-import binary.
//!
//! - stdout is reserved for command results (JSON or human summaries)
//! - stderr receives all log output, human or JSON lines
//! - every run carries a `run_id` for correlating batch logs

pub mod config;

pub use config::{LogConfig, LogFlags, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events are shown by default.
const LOG_TARGETS: &[&str] = &["mp_core", "mp_config", "mp_import"];

fn default_filter(level: LogLevel) -> EnvFilter {
    let directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    EnvFilter::new(directives.join(","))
}

fn build_filter(level: Option<LogLevel>) -> EnvFilter {
    match level {
        Some(level) => default_filter(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(LogLevel::Info)),
    }
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup. Without an explicit level, `RUST_LOG`
/// directives replace the default per-crate filter.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config.level);

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .init();
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .init();
        }
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    // First 12 hex chars are enough to correlate one run's logs
    format!("run-{}", &uuid.simple().to_string()[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();

        assert!(id1.starts_with("run-"));
        assert_eq!(id1.len(), 16);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_explicit_level_ignores_rust_log() {
        let rendered = build_filter(Some(LogLevel::Warn)).to_string();
        assert!(rendered.contains("mp_core=warn"));
    }

    #[test]
    fn test_default_filter_covers_targets() {
        let rendered = default_filter(LogLevel::Debug).to_string();
        for target in LOG_TARGETS {
            assert!(rendered.contains(&format!("{}=debug", target)));
        }
    }
}
