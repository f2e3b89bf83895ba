use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the wisp engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine event channel has been closed by the receiver.
    #[error("engine event channel closed")]
    ChannelClosed,

    /// A candidate source failed while starting production.
    #[error("source error: {0}")]
    Source(String),

    /// Generic error with context.
    #[error("engine error: {0}")]
    Msg(String),
}
