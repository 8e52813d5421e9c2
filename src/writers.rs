//! Contains the trait [`LogWriter`] for the sinks of a [`Logger`](crate::Logger),
//! and the concrete implementations
//!
//! * [`ConsoleWriter`] for stderr or stdout,
//! * [`FileLogWriter`] for a log file that is rotated on a time based schedule,
//! * [`NotificationWriter`] for chat notifications through a [`Transport`],
//!   by default the Telegram Bot API ([`TelegramBot`]).
//!
//! A logger always has a console sink; the file and the notification sink are added
//! depending on its configuration.
//! You can also use your own implementations of [`LogWriter`] and hand them to
//! [`LoggerBuilder::add_writer`](crate::LoggerBuilder::add_writer).
//!
//! Console and file sinks write in the logging thread. The notification sink
//! can hand the remote calls over to the
//! [shared worker pool](crate::threads::shared_pool), so that logging calls do not wait
//! for the network.

mod console_writer;
mod file_log_writer;
mod log_writer;
mod notification_writer;
mod transport;

pub use self::console_writer::{ConsoleStream, ConsoleWriter};
pub use self::file_log_writer::{FileLogWriter, FileLogWriterBuilder};
pub use self::log_writer::LogWriter;
pub use self::notification_writer::{
    Delivery, DeliveryReport, NotificationWriter, Notifier, MAX_MESSAGE_LEN,
};
pub use self::transport::{ChatId, Transport, TransportError};

#[cfg(feature = "telegram")]
pub use self::transport::{TelegramBot, TELEGRAM_API_URL};
