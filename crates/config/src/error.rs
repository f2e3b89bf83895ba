use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the config crate.
pub type Result<T> = StdResult<T, ConfigError>;

/// Errors raised while loading a configuration snapshot.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
