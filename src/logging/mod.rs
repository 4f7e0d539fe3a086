//! Process-wide tracing setup
//!
//! The default sink forwards access events to `tracing`. Applications that
//! don't already install a subscriber can call [`init_tracing`] once at
//! startup.

use crate::config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directives}': {source}")]
    Filter {
        directives: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Build filter directives from a [`LoggingConfig`].
///
/// The result looks like `"info,reqlog::access=warn,reqlog::engine=debug"`;
/// component directives are sorted by name.
///
/// ```rust
/// use reqlog::config::LoggingConfig;
/// use reqlog::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let config = LoggingConfig {
///     component_levels: Some(HashMap::from([("access".to_string(), "warn".to_string())])),
///     ..LoggingConfig::default()
/// };
/// assert_eq!(build_filter_directives(&config), "info,reqlog::access=warn");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",reqlog::{}={}", component, level));
        }
    }

    filter_str
}

/// Install a global subscriber according to `config`.
///
/// `RUST_LOG` takes precedence over the configured levels when set and valid.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(config)?,
    };

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
    }

    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let directives = build_filter_directives(config);
    EnvFilter::try_new(&directives).map_err(|source| LoggingError::Filter { directives, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_directives_base_level_only() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn test_directives_with_components() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            component_levels: Some(HashMap::from([
                ("engine".to_string(), "debug".to_string()),
                ("access".to_string(), "info".to_string()),
            ])),
            ..LoggingConfig::default()
        };
        assert_eq!(
            build_filter_directives(&config),
            "warn,reqlog::access=info,reqlog::engine=debug"
        );
    }

    #[test]
    fn test_invalid_filter_is_reported() {
        let config = LoggingConfig {
            level: "info,reqlog=verbose".to_string(),
            ..LoggingConfig::default()
        };
        let err = build_filter(&config).unwrap_err();
        assert!(matches!(err, LoggingError::Filter { .. }));
        assert!(err.to_string().contains("invalid log filter"));
    }

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig {
            format: LogFormat::Json,
            ..LoggingConfig::default()
        };
        let first = init_tracing(&config);
        let second = init_tracing(&config);
        // Another test binary may have installed a subscriber first; either
        // way the second attempt cannot succeed.
        assert!(first.is_ok() || matches!(first, Err(LoggingError::Init(_))));
        assert!(matches!(second, Err(LoggingError::Init(_))));
    }
}
