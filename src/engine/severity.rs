//! Status code to severity mapping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a request event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Classify a final status code.
    ///
    /// Only exactly 200 is `Info`. 4xx is `Warn`, 5xx and above is `Error`,
    /// everything else (1xx, other 2xx, 3xx) is `Debug`.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Severity::Info,
            400..=499 => Severity::Warn,
            500..=u16::MAX => Severity::Error,
            _ => Severity::Debug,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Severity> for tracing::Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Debug => tracing::Level::DEBUG,
            Severity::Info => tracing::Level::INFO,
            Severity::Warn => tracing::Level::WARN,
            Severity::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(Severity::from_status(200), Severity::Info);
        assert_eq!(Severity::from_status(201), Severity::Debug);
        assert_eq!(Severity::from_status(204), Severity::Debug);
        assert_eq!(Severity::from_status(302), Severity::Debug);
        assert_eq!(Severity::from_status(308), Severity::Debug);
        assert_eq!(Severity::from_status(399), Severity::Debug);
        assert_eq!(Severity::from_status(400), Severity::Warn);
        assert_eq!(Severity::from_status(499), Severity::Warn);
        assert_eq!(Severity::from_status(500), Severity::Error);
        assert_eq!(Severity::from_status(599), Severity::Error);
        assert_eq!(Severity::from_status(100), Severity::Debug);
    }

    #[test]
    fn test_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
    }

    proptest! {
        #[test]
        fn prop_client_errors_warn(status in 400u16..500) {
            prop_assert_eq!(Severity::from_status(status), Severity::Warn);
        }

        #[test]
        fn prop_server_errors_error(status in 500u16..1000) {
            prop_assert_eq!(Severity::from_status(status), Severity::Error);
        }

        #[test]
        fn prop_other_codes_debug(status in 100u16..400) {
            prop_assume!(status != 200);
            prop_assert_eq!(Severity::from_status(status), Severity::Debug);
        }
    }
}
