//! CLI-specific error types and exit code mapping

use storegraph_core::error::{StoreError, StoreGraphError};
use storegraph_engine::EngineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from storegraph-core.
    #[error("{0}")]
    Core(#[from] StoreGraphError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                        |
    /// |------|------------------------------------------------|
    /// | 0    | Success                                        |
    /// | 1    | General / command error                        |
    /// | 2    | Configuration error                            |
    /// | 3    | Target not found in the store                  |
    /// | 4    | Target found but dependency data inconsistent  |
    /// | 5    | Store query failed                             |
    /// | 10   | IO error                                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::Core(core) => match core {
                StoreGraphError::Config(_) => 2,
                StoreGraphError::Store(StoreError::TargetNotFound(_)) => 3,
                StoreGraphError::Store(StoreError::Inconsistent(_)) => 4,
                StoreGraphError::Store(StoreError::QueryFailed(_)) => 5,
                StoreGraphError::Io(_) => 10,
                StoreGraphError::Graph(_) => 1,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        Self::Core(e.into())
    }
}
