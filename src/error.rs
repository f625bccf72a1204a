use thiserror::Error;

/// Errors surfaced while assembling or driving a reduction stack.
///
/// Numeric degeneracies (zero gradient, unchanged regression target) are not
/// errors; they simply mean "no update".
#[derive(Debug, Error)]
pub enum Error {
    /// Hyperparameters rejected at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A delegate learner refused or failed an operation.
    #[error("delegate failure: {0}")]
    Delegate(String),
}

pub type Result<T> = std::result::Result<T, Error>;
