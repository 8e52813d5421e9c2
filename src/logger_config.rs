use crate::{
    writers::ChatId, Logger, LoggerBuilder, NiceToolsError, Schedule, Severity, When,
    DEFAULT_TEMPLATE,
};
use serde_derive::Deserialize;
use std::{path::Path, path::PathBuf, str::FromStr};

/// The complete configuration of a [`Logger`], with defaults for every field.
///
/// Can be read from a toml document; all fields are optional except `name`:
///
/// ```toml
/// name = "billing"
/// when = "W0"             # rotate every Monday night
/// backup_count = 4
/// log_folder = "/var/log/billing"
/// level = "info"
/// telegram_token = "123456:ABC-DEF"
/// telegram_chat_ids = [-1001234567, "@billing_alerts"]
/// ```
///
/// Giving both token and chat ids activates notifications, like
/// [`LoggerBuilder::enable_telegram`] does.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct LoggerConfig {
    /// Name of the logger; part of every line and of the log file name.
    pub name: String,
    /// Template for console and file lines.
    pub template: String,
    /// Write a log file (default: `true`).
    pub enable_file: bool,
    /// Require notifications (default: `false`).
    pub enable_telegram: bool,
    /// Bot token.
    pub telegram_token: Option<String>,
    /// Chats that receive the notifications.
    pub telegram_chat_ids: Option<Vec<ChatId>>,
    /// Deliver notifications on the worker pool (default: `true`).
    pub telegram_async: bool,
    /// Color the console lines (default: `true`).
    pub colored: bool,
    /// Rotation unit: `S`, `M`, `H`, `D`, `midnight` (default), or `W0` to `W6`.
    pub when: String,
    /// Rotation interval in units of `when` (default: 1).
    pub interval: u32,
    /// Number of rotated files that are kept (default: 2, 0 keeps all).
    pub backup_count: usize,
    /// Encoding of the log file; only `utf-8` is supported.
    pub encoding: String,
    /// Folder for the log file and for notification attachments (default: `logs`).
    pub log_folder: PathBuf,
    /// Minimum severity (default: `debug`).
    pub level: Severity,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            template: DEFAULT_TEMPLATE.to_string(),
            enable_file: true,
            enable_telegram: false,
            telegram_token: None,
            telegram_chat_ids: None,
            telegram_async: true,
            colored: true,
            when: "midnight".to_string(),
            interval: 1,
            backup_count: 2,
            encoding: "utf-8".to_string(),
            log_folder: PathBuf::from("logs"),
            level: Severity::Debug,
        }
    }
}

impl LoggerConfig {
    /// The default configuration for a logger with the given name.
    #[must_use]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses a toml document.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Toml` if the document is not valid or contains unknown fields.
    pub fn from_toml(s: &str) -> Result<Self, NiceToolsError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a toml file.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Io` if the file cannot be read,
    /// `NiceToolsError::Toml` if its content is not valid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NiceToolsError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Translates the configuration into a builder, for further programmatic configuration.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::MissingName` if `name` is missing or empty,
    /// `NiceToolsError::Schedule` if `when` cannot be parsed.
    pub fn to_builder(&self) -> Result<LoggerBuilder, NiceToolsError> {
        if self.name.trim().is_empty() {
            return Err(NiceToolsError::MissingName);
        }
        let schedule = Schedule::new(When::from_str(&self.when)?, self.interval);
        let mut builder = Logger::builder(self.name.clone())
            .template(self.template.clone())
            .enable_file(self.enable_file)
            .enable_telegram(self.enable_telegram)
            .telegram_async(self.telegram_async)
            .colored(self.colored)
            .schedule(schedule)
            .backup_count(self.backup_count)
            .encoding(self.encoding.clone())
            .log_folder(self.log_folder.clone())
            .level(self.level);
        if let Some(ref token) = self.telegram_token {
            builder = builder.telegram_token(token.clone());
        }
        if let Some(ref chat_ids) = self.telegram_chat_ids {
            builder = builder.telegram_chat_ids(chat_ids.iter().cloned());
        }
        Ok(builder)
    }

    /// Builds the logger.
    ///
    /// # Errors
    ///
    /// See [`LoggerConfig::to_builder`] and [`LoggerBuilder::try_build`].
    pub fn build(&self) -> Result<Logger, NiceToolsError> {
        self.to_builder()?.try_build()
    }
}
