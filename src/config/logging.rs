//! Process-wide tracing configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// How [`init_tracing`](crate::logging::init_tracing) renders lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("pretty") {
            Ok(LogFormat::Pretty)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(format!("unknown log format '{}', expected pretty or json", s))
        }
    }
}

/// Process-wide subscriber settings.
///
/// `component_levels` maps a module under `reqlog::` to its own level, e.g.
/// `access = "warn"` quiets per-request events while keeping diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_levels: Option<HashMap<String, String>>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: None,
        }
    }
}

impl LoggingConfig {
    /// Apply `REQLOG_LOG_LEVEL` and `REQLOG_LOG_FORMAT`.
    ///
    /// An unrecognized format is ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = lookup("REQLOG_LOG_LEVEL").filter(|l| !l.trim().is_empty()) {
            self.level = level.trim().to_string();
        }
        if let Some(format) = lookup("REQLOG_LOG_FORMAT") {
            match format.trim().parse() {
                Ok(format) => self.format = format,
                Err(e) => tracing::debug!(error = %e, "ignoring REQLOG_LOG_FORMAT"),
            }
        }
        self
    }
}
