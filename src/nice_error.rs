use crate::writers::TransportError;
use thiserror::Error;

/// Describes errors in the initialization of a logger, and errors of the thread and function
/// helpers.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NiceToolsError {
    /// The logger has no name.
    #[error("The logger needs a name")]
    MissingName,

    /// Telegram notifications are enabled, but no bot token was given.
    #[error("Telegram notifications are enabled, but no bot token was given")]
    MissingToken,

    /// Telegram notifications are enabled, but no chat ids were given.
    #[error("Telegram notifications are enabled, but no chat ids were given")]
    MissingDestinations,

    /// Telegram notifications are enabled, but the crate was built without feature `telegram`
    /// and no other transport was given.
    #[error("Telegram notifications need feature `telegram` or an explicitly given transport")]
    NoTransport,

    /// The log line template cannot be parsed.
    #[error("Invalid log line template: {0}")]
    Template(String),

    /// The rotation schedule cannot be parsed.
    #[error("Invalid rotation schedule: {0}")]
    Schedule(String),

    /// The log file encoding is not supported.
    #[error("Unsupported log file encoding '{0}', only utf-8 is supported")]
    Encoding(String),

    /// Log file cannot be written because the specified path is not a directory.
    #[error("Log file cannot be written because the specified path is not a directory")]
    BadDirectory,

    /// Log cannot be written because the configured output directory is not accessible.
    #[error("Log cannot be written because the configured output directory is not accessible")]
    Io(#[from] std::io::Error),

    /// The configuration file cannot be parsed.
    #[error("Configuration cannot be parsed")]
    Toml(#[from] toml::de::Error),

    /// Delivering a notification failed.
    #[error("Delivering a notification failed")]
    Transport(#[from] TransportError),

    /// A wrapped function did not finish within its deadline.
    #[error("{0}")]
    Timeout(String),

    /// The worker pool does not accept jobs anymore.
    #[error("The worker pool was shut down")]
    PoolShutdown,

    /// Some synchronization object is poisoned.
    #[error("Some synchronization object is poisoned")]
    Poison,

    /// Installing the logger as `log` backend failed.
    #[error("Logger initialization failed")]
    Log(#[from] log::SetLoggerError),
}
