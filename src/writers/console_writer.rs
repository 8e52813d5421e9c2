use crate::{writers::LogWriter, DeferredNow, LogRecord, MessageFormatter};
use std::io::Write;

/// The standard stream the console sink writes to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ConsoleStream {
    /// Write to stderr (default).
    #[default]
    Stderr,
    /// Write to stdout.
    Stdout,
    /// Write with `eprintln!`, so that `cargo test` can capture the output.
    SupportCapture,
}

/// Writes formatted lines to stderr or stdout, synchronously in the logging thread.
pub struct ConsoleWriter {
    formatter: MessageFormatter,
    stream: ConsoleStream,
}

impl ConsoleWriter {
    /// Creates a console sink.
    #[must_use]
    pub fn new(formatter: MessageFormatter, stream: ConsoleStream) -> Self {
        Self { formatter, stream }
    }
}

impl LogWriter for ConsoleWriter {
    fn write(&self, now: &mut DeferredNow, record: &LogRecord) -> std::io::Result<()> {
        let line = self.formatter.format(now, record);
        match self.stream {
            ConsoleStream::Stderr => {
                let mut w = std::io::stderr().lock();
                w.write_all(line.as_bytes())?;
                w.write_all(b"\n")
            }
            ConsoleStream::Stdout => {
                let mut w = std::io::stdout().lock();
                w.write_all(line.as_bytes())?;
                w.write_all(b"\n")
            }
            ConsoleStream::SupportCapture => {
                eprintln!("{line}");
                Ok(())
            }
        }
    }

    fn flush(&self) -> std::io::Result<()> {
        match self.stream {
            ConsoleStream::Stderr | ConsoleStream::SupportCapture => std::io::stderr().flush(),
            ConsoleStream::Stdout => std::io::stdout().flush(),
        }
    }
}
