use crate::{
    util::{eprint_err, ErrorCode},
    Schedule,
};
use chrono::{DateTime, Local};
use regex::Regex;
use std::{
    fs::{remove_file, rename, File, OpenOptions},
    io::{LineWriter, Write},
    path::{Path, PathBuf},
};

// The mutable state of a FileLogWriter.
pub(super) struct State {
    directory: PathBuf,
    basename: String,
    path: PathBuf,
    schedule: Schedule,
    backup_count: usize,
    suffix_regex: Regex,
    o_file: Option<LineWriter<File>>,
    rollover_at: DateTime<Local>,
}

impl State {
    pub(super) fn try_new(
        directory: &Path,
        basename: &str,
        schedule: Schedule,
        backup_count: usize,
    ) -> Result<Self, std::io::Error> {
        let path = directory.join(basename);
        // a file from an earlier run rotates relative to its last modification
        let last_modified = get_modification_timestamp(&path);
        let file = open_log_file(&path)?;
        let suffix_regex = Regex::new(schedule.suffix_pattern()).map_err(std::io::Error::other)?;
        Ok(Self {
            directory: directory.to_path_buf(),
            basename: basename.to_string(),
            path,
            schedule,
            backup_count,
            suffix_regex,
            o_file: Some(file),
            rollover_at: schedule.next_rollover(&last_modified),
        })
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    pub(super) fn write_line(
        &mut self,
        now: &DateTime<Local>,
        line: &str,
    ) -> Result<(), std::io::Error> {
        if *now >= self.rollover_at {
            self.rotate(now).unwrap_or_else(|e| {
                eprint_err(ErrorCode::LogFile, "rotating the log file failed", &e);
            });
        }
        if self.o_file.is_none() {
            self.o_file = Some(open_log_file(&self.path)?);
        }
        if let Some(ref mut file) = self.o_file {
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    // Renames the current file to `<basename>.<start of the finished period>`,
    // removes surplus backups, and continues with a fresh file.
    //
    // The next period starts even if renaming fails, so a failing rename is tried
    // once per period and not with every line.
    pub(super) fn rotate(&mut self, now: &DateTime<Local>) -> Result<(), std::io::Error> {
        if let Some(mut file) = self.o_file.take() {
            file.flush().unwrap_or_else(|e| {
                eprint_err(ErrorCode::Flush, "flushing the log file failed", &e);
            });
        }

        let period_start = self.schedule.period_start(&self.rollover_at);
        let rotated_path = self.directory.join(format!(
            "{}.{}",
            self.basename,
            period_start.format(self.schedule.suffix_format())
        ));

        let mut rollover_at = self.schedule.next_rollover(now);
        while rollover_at <= *now {
            rollover_at = self.schedule.next_rollover(&rollover_at);
        }
        self.rollover_at = rollover_at;

        let renamed = rename_to(&self.path, &rotated_path);
        if renamed.is_ok() {
            self.remove_too_old_logfiles().unwrap_or_else(|e| {
                eprint_err(ErrorCode::LogFile, "removing old log files failed", &e);
            });
        }
        self.o_file = Some(open_log_file(&self.path)?);
        renamed
    }

    // Rotated files of this log, oldest first.
    pub(super) fn rotated_files(&self) -> Result<Vec<PathBuf>, std::io::Error> {
        let prefix = format!("{}.", self.basename);
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(suffix) = file_name.strip_prefix(&prefix) {
                if self.suffix_regex.is_match(suffix) {
                    files.push(entry.path());
                }
            }
        }
        // the timestamp suffixes sort chronologically
        files.sort();
        Ok(files)
    }

    fn remove_too_old_logfiles(&self) -> Result<(), std::io::Error> {
        if self.backup_count == 0 {
            return Ok(());
        }
        let files = self.rotated_files()?;
        if files.len() > self.backup_count {
            for file in &files[..files.len() - self.backup_count] {
                remove_file(file)?;
            }
        }
        Ok(())
    }

    pub(super) fn flush(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref mut file) = self.o_file {
            file.flush()?;
        }
        Ok(())
    }

    pub(super) fn shutdown(&mut self) {
        if let Some(mut file) = self.o_file.take() {
            file.flush().unwrap_or_else(|e| {
                eprint_err(ErrorCode::Flush, "flushing the log file failed", &e);
            });
        }
    }
}

fn open_log_file(path: &Path) -> Result<LineWriter<File>, std::io::Error> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(LineWriter::new(file))
}

fn rename_to(path: &Path, rotated_path: &Path) -> Result<(), std::io::Error> {
    if rotated_path.exists() {
        remove_file(rotated_path)?;
    }
    match rename(path, rotated_path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn get_modification_timestamp(path: &Path) -> DateTime<Local> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_or_else(|_| Local::now(), DateTime::<Local>::from)
}
