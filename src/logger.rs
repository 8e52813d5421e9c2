use crate::{
    util::{eprint_err, is_reentrant, ErrorCode, ReentryGuard},
    writers::{
        ChatId, ConsoleStream, ConsoleWriter, FileLogWriter, LogWriter, NotificationWriter,
        Notifier, Transport,
    },
    Context, DeferredNow, LogRecord, MessageFormatter, NiceToolsError, Schedule, Severity,
    Template, DEFAULT_TEMPLATE,
};
use std::{
    backtrace::{Backtrace, BacktraceStatus},
    panic::Location,
    path::{Path, PathBuf},
    sync::Arc,
};

/// A named logger that writes every record to the console, and optionally to a rotating
/// log file and to chat notifications.
///
/// Create it with [`Logger::builder`], or from a [`LoggerConfig`](crate::LoggerConfig).
///
/// ```rust,no_run
/// use nice_tools::{Context, Logger};
///
/// let logger = Logger::builder("billing").try_build().unwrap();
/// logger.info("started");
/// logger.warning_with("slow response", &Context::tagged("http").kwarg("ms", 1532));
/// // 2024-03-01 17:04:13,095 - (6):[WARNING] --> [http] - slow response | {'ms': 1532}
/// ```
///
/// Each leveled method composes the message as `"[tag] - message"`, where the tag defaults
/// to the method name; positional and keyword values of a [`Context`] are appended.
/// Console and file are written in the calling thread; notifications are dispatched
/// as configured. Problems of the sinks are reported on stderr and never returned.
pub struct Logger {
    name: String,
    min_severity: Severity,
    writers: Vec<Box<dyn LogWriter>>,
    o_file_path: Option<PathBuf>,
    notifications: bool,
}

macro_rules! leveled {
    ($(#[$doc:meta] $plain:ident, $with:ident, $severity:expr;)*) => {$(
        #[$doc]
        #[track_caller]
        pub fn $plain(&self, msg: &str) {
            self.compose_and_log($severity, stringify!($plain), msg, None, Location::caller());
        }

        #[$doc]
        ///
        /// The context provides the tag and additional values.
        #[track_caller]
        pub fn $with(&self, msg: &str, ctx: &Context) {
            self.compose_and_log(
                $severity,
                stringify!($plain),
                msg,
                Some(ctx),
                Location::caller(),
            );
        }
    )*};
}

impl Logger {
    /// Instantiates a builder for a logger with the given name.
    #[must_use]
    pub fn builder<S: Into<String>>(name: S) -> LoggerBuilder {
        LoggerBuilder::new(name.into())
    }

    /// The name of the logger.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records below this severity are dropped.
    #[must_use]
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// Path of the current log file, if the file sink is active.
    #[must_use]
    pub fn log_file_path(&self) -> Option<&Path> {
        self.o_file_path.as_deref()
    }

    /// `true` if the notification sink is active.
    #[must_use]
    pub fn notifications_enabled(&self) -> bool {
        self.notifications
    }

    leveled! {
        /// Logs the message with severity debug.
        debug, debug_with, Severity::Debug;
        /// Logs the message with severity info.
        info, info_with, Severity::Info;
        /// Logs the message with severity warning.
        warning, warning_with, Severity::Warning;
        /// Logs the message with severity error.
        error, error_with, Severity::Error;
        /// Logs the message with severity critical.
        critical, critical_with, Severity::Critical;
    }

    /// Logs the message with severity error, followed by a backtrace of the calling thread.
    ///
    /// The backtrace is only captured if `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE`
    /// enable it.
    #[track_caller]
    pub fn exception(&self, msg: &str) {
        self.exception_with(msg, &Context::new());
    }

    /// Logs the message with severity error, followed by the error chain of the context
    /// and a backtrace of the calling thread.
    #[track_caller]
    pub fn exception_with(&self, msg: &str, ctx: &Context) {
        let location = Location::caller();
        if Severity::Error < self.min_severity {
            return;
        }
        let mut message = ctx.compose(msg, "exception");
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            message.push_str("\nBacktrace:\n");
            message.push_str(&backtrace.to_string());
        }
        self.log(Severity::Error, &message, location.file(), location.line());
    }

    fn compose_and_log(
        &self,
        severity: Severity,
        default_tag: &str,
        msg: &str,
        o_ctx: Option<&Context>,
        location: &Location,
    ) {
        if severity < self.min_severity {
            return;
        }
        let message = match o_ctx {
            Some(ctx) => ctx.compose(msg, default_tag),
            None => crate::compose_message(msg, default_tag, &[], &[]),
        };
        self.log(severity, &message, location.file(), location.line());
    }

    /// Hands an already composed message to all sinks.
    ///
    /// Records that are produced by the sinks themselves while they write are dropped.
    pub fn log(&self, severity: Severity, message: &str, file: &str, line: u32) {
        if severity < self.min_severity || is_reentrant() {
            return;
        }
        let _guard = ReentryGuard::enter();
        let mut now = DeferredNow::new();
        let record = LogRecord::new(severity, &self.name, message, file, line);
        for writer in &self.writers {
            if let Err(e) = writer.write(&mut now, &record) {
                eprint_err(ErrorCode::Write, "writing log line failed", &e);
            }
        }
    }

    /// Flushes all sinks.
    pub fn flush(&self) {
        for writer in &self.writers {
            if let Err(e) = writer.flush() {
                eprint_err(ErrorCode::Flush, "flushing failed", &e);
            }
        }
    }

    /// Flushes all sinks and closes the log file.
    ///
    /// A later log call reopens the file.
    pub fn shutdown(&self) {
        self.flush();
        for writer in &self.writers {
            writer.shutdown();
        }
    }

    /// Registers the logger as backend of the `log` macros and returns a handle to it.
    ///
    /// `log::Level::Trace` is written as debug, `log::Level::Warn` as warning.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Log` if another backend was already registered.
    pub fn install(self) -> Result<Arc<Logger>, NiceToolsError> {
        let logger = Arc::new(self);
        log::set_boxed_logger(Box::new(LogBridge(Arc::clone(&logger))))?;
        log::set_max_level(logger.min_severity.into());
        Ok(logger)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.flush();
    }
}

struct LogBridge(Arc<Logger>);

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Severity::from(metadata.level()) >= self.0.min_severity
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        self.0.log(
            Severity::from(record.level()),
            &message,
            record.file().unwrap_or("<unnamed>"),
            record.line().unwrap_or(0),
        );
    }

    fn flush(&self) {
        self.0.flush();
    }
}

/// Builder for [`Logger`].
///
/// Without further configuration, the logger writes colored lines to stderr and
/// uncolored lines to `logs/<name>-logs`, which is rotated at midnight.
///
/// Notifications are activated with [`LoggerBuilder::enable_telegram`], or implicitly
/// by providing both a token and at least one chat id.
#[allow(clippy::struct_excessive_bools)]
pub struct LoggerBuilder {
    name: String,
    template: String,
    colored: bool,
    console_stream: ConsoleStream,
    level: Severity,
    enable_file: bool,
    log_folder: PathBuf,
    schedule: Schedule,
    backup_count: usize,
    encoding: String,
    enable_telegram: bool,
    o_telegram_token: Option<String>,
    o_telegram_chat_ids: Option<Vec<ChatId>>,
    telegram_async: bool,
    o_transport: Option<Box<dyn Transport>>,
    extra_writers: Vec<Box<dyn LogWriter>>,
}

impl LoggerBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            template: DEFAULT_TEMPLATE.to_string(),
            colored: true,
            console_stream: ConsoleStream::default(),
            level: Severity::Debug,
            enable_file: true,
            log_folder: PathBuf::from("logs"),
            schedule: Schedule::default(),
            backup_count: 2,
            encoding: "utf-8".to_string(),
            enable_telegram: false,
            o_telegram_token: None,
            o_telegram_chat_ids: None,
            telegram_async: true,
            o_transport: None,
            extra_writers: Vec::new(),
        }
    }

    /// Template for console and file lines; see [`Template`] for the placeholders.
    #[must_use]
    pub fn template<S: Into<String>>(mut self, template: S) -> Self {
        self.template = template.into();
        self
    }

    /// Switches the colors of console lines on or off (default: on).
    #[must_use]
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// The stream for console lines (default: stderr).
    #[must_use]
    pub fn console_stream(mut self, stream: ConsoleStream) -> Self {
        self.console_stream = stream;
        self
    }

    /// Records below this severity are dropped (default: debug).
    #[must_use]
    pub fn level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    /// Switches the file sink on or off (default: on).
    #[must_use]
    pub fn enable_file(mut self, enable: bool) -> Self {
        self.enable_file = enable;
        self
    }

    /// Folder for the log file and for notification attachments (default: `logs`).
    #[must_use]
    pub fn log_folder<P: Into<PathBuf>>(mut self, folder: P) -> Self {
        self.log_folder = folder.into();
        self
    }

    /// When the log file is rotated (default: at midnight).
    #[must_use]
    pub fn schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Number of rotated log files that are kept (default: 2, 0 keeps all).
    #[must_use]
    pub fn backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Encoding of the log file; only `utf-8` is supported.
    #[must_use]
    pub fn encoding<S: Into<String>>(mut self, encoding: S) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Requires notifications; then a token and at least one chat id must be given.
    #[must_use]
    pub fn enable_telegram(mut self, enable: bool) -> Self {
        self.enable_telegram = enable;
        self
    }

    /// The bot token.
    #[must_use]
    pub fn telegram_token<S: Into<String>>(mut self, token: S) -> Self {
        self.o_telegram_token = Some(token.into());
        self
    }

    /// The chats that receive the notifications, in delivery order.
    #[must_use]
    pub fn telegram_chat_ids<I, C>(mut self, chat_ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ChatId>,
    {
        self.o_telegram_chat_ids = Some(chat_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Delivers notifications on the worker pool (default), or in the logging thread.
    #[must_use]
    pub fn telegram_async(mut self, run_async: bool) -> Self {
        self.telegram_async = run_async;
        self
    }

    /// Uses the given transport for notifications instead of the Telegram Bot API.
    ///
    /// With an explicit transport, no token is needed.
    #[must_use]
    pub fn transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.o_transport = Some(transport);
        self
    }

    /// Adds a sink that gets every record, after the built-in sinks.
    #[must_use]
    pub fn add_writer(mut self, writer: Box<dyn LogWriter>) -> Self {
        self.extra_writers.push(writer);
        self
    }

    // Decides if notifications are active, before anything is created.
    fn validate_notifications(&self) -> Result<bool, NiceToolsError> {
        let has_credentials = self.o_telegram_token.is_some() || self.o_transport.is_some();
        let has_chats = self
            .o_telegram_chat_ids
            .as_ref()
            .is_some_and(|ids| !ids.is_empty());
        if self.enable_telegram {
            if !has_credentials {
                return Err(NiceToolsError::MissingToken);
            }
            if !has_chats {
                return Err(NiceToolsError::MissingDestinations);
            }
            Ok(true)
        } else {
            Ok(has_credentials && has_chats)
        }
    }

    fn validate_encoding(&self) -> Result<(), NiceToolsError> {
        if self.encoding.eq_ignore_ascii_case("utf-8") || self.encoding.eq_ignore_ascii_case("utf8")
        {
            Ok(())
        } else {
            Err(NiceToolsError::Encoding(self.encoding.clone()))
        }
    }

    /// Produces the logger.
    ///
    /// All checks are done before the log folder or any file is created.
    ///
    /// # Errors
    ///
    /// * `NiceToolsError::MissingToken` or `NiceToolsError::MissingDestinations` if
    ///   notifications are enabled but incompletely configured,
    /// * `NiceToolsError::Template` if the template cannot be parsed,
    /// * `NiceToolsError::Encoding` if another encoding than utf-8 is requested,
    /// * `NiceToolsError::Io` or `NiceToolsError::BadDirectory` if the log file cannot
    ///   be created,
    /// * `NiceToolsError::Transport` if the HTTP client cannot be initialized.
    pub fn try_build(self) -> Result<Logger, NiceToolsError> {
        let notifications = self.validate_notifications()?;
        let template = Template::parse(&self.template)?;
        if self.enable_file {
            self.validate_encoding()?;
        }

        let mut writers: Vec<Box<dyn LogWriter>> = Vec::with_capacity(3);
        writers.push(Box::new(ConsoleWriter::new(
            MessageFormatter::with_template(&self.name, &template, self.colored),
            self.console_stream,
        )));

        let mut o_file_path = None;
        if self.enable_file {
            let file_writer =
                FileLogWriter::builder(&self.log_folder, format!("{}-logs", self.name))
                    .schedule(self.schedule)
                    .backup_count(self.backup_count)
                    .format(MessageFormatter::with_template(&self.name, &template, false))
                    .try_build()?;
            o_file_path = Some(file_writer.current_path()?);
            writers.push(Box::new(file_writer));
        }

        if notifications {
            let transport = match (self.o_transport, self.o_telegram_token) {
                (Some(transport), _) => transport,
                (None, Some(token)) => telegram_transport(&token)?,
                (None, None) => return Err(NiceToolsError::MissingToken),
            };
            let notifier = Notifier::new(
                transport,
                self.o_telegram_chat_ids.unwrap_or_default(),
                &self.log_folder,
                self.telegram_async,
            );
            writers.push(Box::new(NotificationWriter::new(notifier)));
        }

        writers.extend(self.extra_writers);

        Ok(Logger {
            name: self.name,
            min_severity: self.level,
            writers,
            o_file_path,
            notifications,
        })
    }
}

#[cfg(feature = "telegram")]
fn telegram_transport(token: &str) -> Result<Box<dyn Transport>, NiceToolsError> {
    Ok(Box::new(crate::writers::TelegramBot::new(token)?))
}

#[cfg(not(feature = "telegram"))]
fn telegram_transport(_token: &str) -> Result<Box<dyn Transport>, NiceToolsError> {
    Err(NiceToolsError::NoTransport)
}
