//! Logging configuration.
//!
//! The level comes from, highest first: `-q`/`-v`/`--log-level`, `MP_LOG`,
//! then `RUST_LOG` directives (applied by the filter itself), then `info`.
//! The format comes from `--log-format`, then `MP_LOG_FORMAT`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const ENV_LOG_LEVEL: &str = "MP_LOG";
pub const ENV_LOG_FORMAT: &str = "MP_LOG_FORMAT";

/// How log lines are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    #[value(alias = "json")]
    Jsonl,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Option<Self> {
        Self::from_str(value.trim(), true).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Level selected by repeated `-v` flags, if any.
    pub fn from_verbosity(count: u8) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }

    fn from_env_value(value: &str) -> Option<Self> {
        Self::from_str(value.trim(), true).ok()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command-line logging flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFlags {
    pub level: Option<LogLevel>,
    pub format: Option<LogFormat>,
    pub verbose: u8,
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Explicit level; `None` defers to `RUST_LOG`, then `info`.
    pub level: Option<LogLevel>,
    /// Prefix human lines with a timestamp.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: None,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Resolve from `MP_LOG`, `MP_LOG_FORMAT` and the CLI flags.
    pub fn from_env(flags: LogFlags) -> Self {
        Self::resolve(
            flags,
            std::env::var(ENV_LOG_LEVEL).ok().as_deref(),
            std::env::var(ENV_LOG_FORMAT).ok().as_deref(),
        )
    }

    fn resolve(flags: LogFlags, env_level: Option<&str>, env_format: Option<&str>) -> Self {
        let cli_level = if flags.quiet {
            Some(LogLevel::Error)
        } else {
            flags.level.or(LogLevel::from_verbosity(flags.verbose))
        };

        LogConfig {
            format: flags
                .format
                .or_else(|| env_format.and_then(LogFormat::from_env_value))
                .unwrap_or_default(),
            level: cli_level.or_else(|| env_level.and_then(LogLevel::from_env_value)),
            timestamps: true,
        }
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_values_parse_case_insensitively() {
        assert_eq!(LogLevel::from_env_value("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_env_value("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_env_value("loud"), None);
        assert_eq!(LogFormat::from_env_value("json"), Some(LogFormat::Jsonl));
        assert_eq!(LogFormat::from_env_value("xml"), None);
    }

    #[test]
    fn test_quiet_beats_verbose() {
        let flags = LogFlags {
            verbose: 2,
            quiet: true,
            ..LogFlags::default()
        };
        assert_eq!(LogConfig::resolve(flags, None, None).level, Some(LogLevel::Error));
    }

    #[test]
    fn test_cli_beats_env() {
        let flags = LogFlags {
            verbose: 1,
            format: Some(LogFormat::Human),
            ..LogFlags::default()
        };
        let config = LogConfig::resolve(flags, Some("error"), Some("jsonl"));
        assert_eq!(config.level, Some(LogLevel::Debug));
        assert_eq!(config.format, LogFormat::Human);
    }

    #[test]
    fn test_env_used_without_flags() {
        let config = LogConfig::resolve(LogFlags::default(), Some("warn"), Some("jsonl"));
        assert_eq!(config.level, Some(LogLevel::Warn));
        assert_eq!(config.format, LogFormat::Jsonl);

        let unset = LogConfig::resolve(LogFlags::default(), Some("bogus"), None);
        assert_eq!(unset.level, None);
        assert_eq!(unset.format, LogFormat::Human);
    }

    #[test]
    fn test_levels_order_by_verbosity() {
        assert!(LogLevel::Trace > LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(0), None);
        assert_eq!(LogLevel::from_verbosity(5), Some(LogLevel::Trace));
    }
}
