use super::{FileLogWriter, State};
use crate::{MessageFormatter, NiceToolsError, Schedule, Template};
use std::path::PathBuf;

/// Builder for [`FileLogWriter`].
#[allow(clippy::module_name_repetitions)]
pub struct FileLogWriterBuilder {
    directory: PathBuf,
    basename: String,
    schedule: Schedule,
    backup_count: usize,
    o_formatter: Option<MessageFormatter>,
}

impl FileLogWriterBuilder {
    pub(super) fn new(directory: PathBuf, basename: String) -> Self {
        Self {
            directory,
            basename,
            schedule: Schedule::default(),
            backup_count: 2,
            o_formatter: None,
        }
    }

    /// Defines when the file is rotated; the default is at midnight.
    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Number of rotated files that are kept; older ones are deleted.
    ///
    /// The default is 2. With 0, rotated files are never deleted.
    #[must_use]
    pub fn backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Makes the `FileLogWriter` use the provided formatter for the log lines,
    /// rather than the uncolored default template with the basename as logger name.
    #[must_use]
    pub fn format(mut self, formatter: MessageFormatter) -> Self {
        self.o_formatter = Some(formatter);
        self
    }

    /// Produces the `FileLogWriter`.
    ///
    /// The directory is created if it does not exist yet.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Io` if the directory cannot be created or the file cannot be opened,
    /// `NiceToolsError::BadDirectory` if the path exists but is not a directory.
    pub fn try_build(self) -> Result<FileLogWriter, NiceToolsError> {
        // make sure the folder exists or create it
        std::fs::create_dir_all(&self.directory)?;
        if !std::fs::metadata(&self.directory)?.is_dir() {
            return Err(NiceToolsError::BadDirectory);
        }

        let formatter = self.o_formatter.unwrap_or_else(|| {
            MessageFormatter::with_template(&self.basename, &Template::default(), false)
        });
        let state = State::try_new(
            &self.directory,
            &self.basename,
            self.schedule,
            self.backup_count,
        )?;
        Ok(FileLogWriter::new(formatter, state))
    }
}
