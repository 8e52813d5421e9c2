use crate::{DeferredNow, LogRecord};
use std::io;

/// Writes to a single log output stream.
///
/// The [`Logger`](crate::Logger) owns a list of boxed `LogWriter`s and hands every record
/// to each of them; boxed instances can also be added as additional sinks with
/// [`LoggerBuilder::add_writer`](crate::LoggerBuilder::add_writer).
pub trait LogWriter: Sync + Send {
    /// Writes out a log line.
    ///
    /// # Errors
    ///
    /// `std::io::Error`
    fn write(&self, now: &mut DeferredNow, record: &LogRecord) -> io::Result<()>;

    /// Flushes any buffered records.
    ///
    /// # Errors
    ///
    /// `std::io::Error`
    fn flush(&self) -> io::Result<()>;

    /// Cleanup open resources, if necessary.
    fn shutdown(&self) {}
}
