// only enables the `doc_cfg` feature when the `docsrs` configuration attribute is defined
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::unused_self)]
#![allow(clippy::module_name_repetitions)]
//! A small toolbox for services: a named logger with several sinks, helpers for running
//! work in the background, and function wrappers for deadlines and error handling.
//!
//! ```rust,no_run
//! use nice_tools::{Context, Logger};
//!
//! let logger = Logger::builder("billing")
//!     .telegram_token("123456:ABC-DEF")
//!     .telegram_chat_ids([-1001234567_i64])
//!     .try_build()
//!     .unwrap();
//!
//! logger.info("Task successfully read from conf.json");
//! logger.error_with("payment failed", &Context::new().kwarg("invoice", 4711));
//! ```
//!
//! The [`Logger`] writes every record
//!
//! * to stderr, colored by severity,
//! * to the file `<log_folder>/<name>-logs`, which is rotated on a [`Schedule`]
//!   (by default at midnight) and keeps a configurable number of old files,
//! * and, if configured, as Telegram notification to a list of chats; long texts are
//!   sent as document, and the remote calls run on a worker pool.
//!
//! See
//!
//! * [`LoggerBuilder`] and [`LoggerConfig`] for all configuration options,
//! * [`BotLogger`] for sending messages only as notifications,
//! * module [`writers`] for the sinks and for adding own sinks,
//! * module [`threads`] for fire-and-forget execution and the shared worker pool,
//! * module [`func_tools`] for [`timeout`](func_tools::timeout) and
//!   [`catch_errors`](func_tools::catch_errors).
//!
//! By default, i.e. if feature `colors` is not switched off, the console lines are colored.
//! Feature `telegram` (also on by default) provides the Telegram transport.

mod bot_logger;
mod deferred_now;
mod formats;
mod logger;
mod logger_config;
mod nice_error;
mod parameters;
mod record;
mod severity;
mod util;

pub mod func_tools;
pub mod threads;
pub mod writers;

pub use crate::bot_logger::BotLogger;
pub use crate::deferred_now::DeferredNow;
pub use crate::formats::{
    MessageFormatter, Template, DEFAULT_NOTIFICATION_TEMPLATE, DEFAULT_TEMPLATE,
};
pub use crate::logger::{Logger, LoggerBuilder};
pub use crate::logger_config::LoggerConfig;
pub use crate::nice_error::NiceToolsError;
pub use crate::parameters::{Schedule, When};
pub use crate::record::{compose_message, Context, LogRecord, Value};
pub use crate::severity::Severity;
