//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading logger options from a file.
///
/// Resolving a [`Config`](super::Config) never fails; these only surface from
/// [`LoggerOptions::load`](super::LoggerOptions::load).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}
