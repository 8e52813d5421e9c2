mod builder;
mod state;

pub use self::builder::FileLogWriterBuilder;

use self::state::State;
use crate::{
    util::{eprint_err, poison_err, ErrorCode},
    writers::LogWriter,
    DeferredNow, LogRecord, MessageFormatter, NiceToolsError,
};
use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

/// A configurable [`LogWriter`] implementation that writes to a file in a given folder,
/// and rotates it on a time based [`Schedule`](crate::Schedule).
///
/// The current file is `<directory>/<basename>`; rotated files get the start of
/// their period appended, e.g. `logs/svc-logs.2024-03-14`.
///
/// Lines are written without ANSI color codes, unless a colored formatter is explicitly
/// configured with [`FileLogWriterBuilder::format`].
///
/// See [`FileLogWriterBuilder`] for the configuration options.
pub struct FileLogWriter {
    formatter: MessageFormatter,
    state: Mutex<State>,
}

impl FileLogWriter {
    /// Instantiates a builder for `FileLogWriter`.
    #[must_use]
    pub fn builder<P: Into<PathBuf>, S: Into<String>>(
        directory: P,
        basename: S,
    ) -> FileLogWriterBuilder {
        FileLogWriterBuilder::new(directory.into(), basename.into())
    }

    fn new(formatter: MessageFormatter, state: State) -> Self {
        Self {
            formatter,
            state: Mutex::new(state),
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State>, std::io::Error> {
        self.state
            .lock()
            .map_err(|_| poison_err("FileLogWriter is poisoned"))
    }

    /// The path of the file that is currently written.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Poison` if some thread panicked while writing.
    pub fn current_path(&self) -> Result<PathBuf, NiceToolsError> {
        Ok(self
            .state
            .lock()
            .map_err(|_| NiceToolsError::Poison)?
            .path()
            .to_path_buf())
    }

    /// The rotated files that still exist, oldest first.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Io` if the directory cannot be read,
    /// `NiceToolsError::Poison` if some thread panicked while writing.
    pub fn rotated_files(&self) -> Result<Vec<PathBuf>, NiceToolsError> {
        Ok(self
            .state
            .lock()
            .map_err(|_| NiceToolsError::Poison)?
            .rotated_files()?)
    }

    /// Rotates the current file immediately, independent of the schedule.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Io` if renaming or reopening fails,
    /// `NiceToolsError::Poison` if some thread panicked while writing.
    pub fn trigger_rotation(&self) -> Result<(), NiceToolsError> {
        let mut state = self.state.lock().map_err(|_| NiceToolsError::Poison)?;
        state.rotate(&chrono::Local::now())?;
        Ok(())
    }
}

impl LogWriter for FileLogWriter {
    fn write(&self, now: &mut DeferredNow, record: &LogRecord) -> std::io::Result<()> {
        let line = self.formatter.format(now, record);
        self.lock_state()?.write_line(now.now(), &line)
    }

    fn flush(&self) -> std::io::Result<()> {
        self.lock_state()?.flush()
    }

    fn shutdown(&self) {
        match self.lock_state() {
            Ok(mut state) => state.shutdown(),
            Err(e) => eprint_err(ErrorCode::Poison, "cannot shut down the log file", &e),
        }
    }
}
