//! Declarative logger options
//!
//! The serializable subset of [`Config`]: everything except the skip
//! predicate and the output sink, which only exist in code. Meant to be
//! embedded in a host's TOML configuration.
//!
//! # Precedence
//!
//! 1. Environment variables (`REQLOG_*`)
//! 2. Configuration file (TOML)
//! 3. Default values
//!
//! ```rust
//! use reqlog::config::LoggerOptions;
//!
//! let options: LoggerOptions = toml::from_str(r#"
//! format = ["status", "method", "header:X-Request-Id"]
//! pretty_latency = true
//! "#).unwrap();
//! assert_eq!(options.format.len(), 3);
//! assert_eq!(options.time_zone, "Local");
//! ```

use super::{
    default_format, Config, ConfigError, DEFAULT_BODY_LIMIT, DEFAULT_TIME_FORMAT, LOCAL_TIME_ZONE,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    pub format: Vec<String>,
    pub time_format: String,
    pub time_zone: String,
    pub time_interval_ms: u64,
    pub pretty_latency: bool,
    pub body_limit: usize,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            format: default_format(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            time_zone: LOCAL_TIME_ZONE.to_string(),
            time_interval_ms: 500,
            pretty_latency: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl LoggerOptions {
    /// Load options from a TOML file
    ///
    /// If path is None, returns default options.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (the current value is kept).
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(format) = lookup("REQLOG_FORMAT") {
            let tags: Vec<String> = format
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            if !tags.is_empty() {
                self.format = tags;
            }
        }
        if let Some(layout) = lookup("REQLOG_TIME_FORMAT") {
            self.time_format = layout;
        }
        if let Some(zone) = lookup("REQLOG_TIME_ZONE") {
            self.time_zone = zone;
        }
        if let Some(interval) = lookup("REQLOG_TIME_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.time_interval_ms = ms;
            }
        }
        if let Some(limit) = lookup("REQLOG_BODY_LIMIT") {
            if let Ok(bytes) = limit.parse() {
                self.body_limit = bytes;
            }
        }
        if let Some(pretty) = lookup("REQLOG_PRETTY_LATENCY") {
            if let Ok(p) = pretty.to_lowercase().parse() {
                self.pretty_latency = p;
            }
        }
        self
    }
}

impl From<LoggerOptions> for Config {
    fn from(options: LoggerOptions) -> Self {
        Config {
            skip: None,
            format: options.format,
            time_format: options.time_format,
            time_zone: options.time_zone,
            time_interval: Duration::from_millis(options.time_interval_ms),
            pretty_latency: options.pretty_latency,
            body_limit: options.body_limit,
            output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_none_returns_defaults() {
        let options = LoggerOptions::load(None).unwrap();
        assert_eq!(options, LoggerOptions::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = LoggerOptions::load(Some(Path::new("/nonexistent/reqlog.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
format = ["status", "locals:user"]
time_zone = "UTC"
time_interval_ms = 1000
"#
        )
        .unwrap();

        let options = LoggerOptions::load(Some(file.path())).unwrap();
        assert_eq!(options.format, vec!["status", "locals:user"]);
        assert_eq!(options.time_zone, "UTC");
        assert_eq!(options.time_interval_ms, 1000);
        assert_eq!(options.time_format, DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "format = [").unwrap();
        let err = LoggerOptions::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let options = LoggerOptions::default().with_overrides(env(&[
            ("REQLOG_FORMAT", "status, method ,,path"),
            ("REQLOG_TIME_ZONE", "UTC"),
            ("REQLOG_TIME_INTERVAL_MS", "750"),
            ("REQLOG_PRETTY_LATENCY", "TRUE"),
            ("REQLOG_BODY_LIMIT", "4096"),
        ]));
        assert_eq!(options.format, vec!["status", "method", "path"]);
        assert_eq!(options.time_zone, "UTC");
        assert_eq!(options.time_interval_ms, 750);
        assert!(options.pretty_latency);
        assert_eq!(options.body_limit, 4096);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let options = LoggerOptions::default().with_overrides(env(&[
            ("REQLOG_FORMAT", " , "),
            ("REQLOG_TIME_INTERVAL_MS", "soon"),
            ("REQLOG_PRETTY_LATENCY", "yes please"),
        ]));
        assert_eq!(options, LoggerOptions::default());
    }

    #[test]
    fn test_into_config() {
        let config: Config = LoggerOptions {
            time_interval_ms: 2000,
            pretty_latency: true,
            ..LoggerOptions::default()
        }
        .into();
        assert_eq!(config.time_interval, Duration::from_secs(2));
        assert!(config.pretty_latency);
        assert!(config.skip.is_none());
        assert!(config.output.is_none());
    }
}
