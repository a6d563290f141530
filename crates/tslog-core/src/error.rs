//! Error types for tslog

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`Logger::init`](crate::Logger::init).
///
/// On any of these the logger stays stopped: no writer thread exists and no
/// sink is held.
#[derive(Error, Debug)]
pub enum InitError {
    /// The sink file could not be opened (bad path, permissions, ...)
    #[error("failed to open log file {}: {source}", .path.display())]
    Open {
        /// Path that was passed to `init`
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },

    /// `init` was called while a previous lifecycle is still running
    #[error("logger is already running with log file {}", .path.display())]
    AlreadyRunning {
        /// Sink of the lifecycle that is still running
        path: PathBuf,
    },

    /// The OS refused to start the writer thread
    #[error("failed to spawn log writer thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The configuration passed to `init_with` is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors returned by the logging calls.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    /// Logging was attempted before `init` or after `shutdown`
    #[error("logger is not running (call init first)")]
    NotRunning,
}

/// Invalid logger configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The sink path is empty
    #[error("log file path is empty")]
    EmptyPath,

    /// An environment variable holds a value that cannot be parsed
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Unknown level name passed to `LogLevel::from_str`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0:?}")]
pub struct LevelParseError(pub String);

/// A sink line that does not have the `<timestamp> [T<id>] [<LEVEL>] <message>` shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineParseError {
    /// The line is shorter than a timestamp or the timestamp is malformed
    #[error("malformed timestamp in line: {0:?}")]
    Timestamp(String),

    /// The `[T<id>]` section is missing or not numeric
    #[error("malformed thread tag in line: {0:?}")]
    Thread(String),

    /// The `[<LEVEL>]` section is missing or names an unknown level
    #[error("malformed level in line: {0:?}")]
    Level(String),
}
