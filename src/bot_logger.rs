use crate::{
    writers::{ChatId, DeliveryReport, Notifier, Transport},
    Context, NiceToolsError,
};
use std::path::PathBuf;

/// Sends messages only as chat notifications, each prefixed with the name of the bot logger.
///
/// ```rust,no_run
/// use nice_tools::{BotLogger, Context};
///
/// let bot = BotLogger::new("backup", "123456:ABC-DEF", [-1001234567_i64], true).unwrap();
/// bot.log("nightly backup done");
/// bot.log_with("disk almost full", &Context::tagged("disk").kwarg("free_gb", 3));
/// // [backup]
/// //
/// // [disk] - disk almost full | {'free_gb': 3}
/// ```
///
/// Long messages are sent as document, like with the notification sink of a
/// [`Logger`](crate::Logger); attachments are written to the folder `logs`
/// unless [`BotLogger::with_transport`] is used with another folder.
pub struct BotLogger {
    name: String,
    notifier: Notifier,
}

impl BotLogger {
    /// Creates a bot logger that uses the Telegram Bot API.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::MissingDestinations` if no chat id is given,
    /// `NiceToolsError::Transport` if the HTTP client cannot be initialized.
    #[cfg(feature = "telegram")]
    pub fn new<S, I, C>(
        name: S,
        token: &str,
        chat_ids: I,
        run_async: bool,
    ) -> Result<Self, NiceToolsError>
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<ChatId>,
    {
        Self::with_transport(
            name,
            Box::new(crate::writers::TelegramBot::new(token)?),
            chat_ids,
            "logs",
            run_async,
        )
    }

    /// Creates a bot logger with an arbitrary transport.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::MissingDestinations` if no chat id is given.
    pub fn with_transport<S, I, C, P>(
        name: S,
        transport: Box<dyn Transport>,
        chat_ids: I,
        attachment_dir: P,
        run_async: bool,
    ) -> Result<Self, NiceToolsError>
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<ChatId>,
        P: Into<PathBuf>,
    {
        let chat_ids: Vec<ChatId> = chat_ids.into_iter().map(Into::into).collect();
        if chat_ids.is_empty() {
            return Err(NiceToolsError::MissingDestinations);
        }
        Ok(Self {
            name: name.into(),
            notifier: Notifier::new(transport, chat_ids, attachment_dir, run_async),
        })
    }

    /// The name that prefixes each message.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends `"[<name>]\n\n[log] - <msg>"`.
    pub fn log(&self, msg: &str) {
        self.notifier.send(self.text(msg, &Context::new()));
    }

    /// Sends the message, composed with the tag and the values of the context.
    pub fn log_with(&self, msg: &str, ctx: &Context) {
        self.notifier.send(self.text(msg, ctx));
    }

    /// Sends the message in the calling thread, independent of the dispatch mode,
    /// and reports the outcome.
    #[must_use]
    pub fn log_and_report(&self, msg: &str, ctx: &Context) -> DeliveryReport {
        self.notifier.deliver(&self.text(msg, ctx))
    }

    fn text(&self, msg: &str, ctx: &Context) -> String {
        format!("[{}]\n\n{}", self.name, ctx.compose(msg, "log"))
    }
}

#[cfg(test)]
mod test {
    use super::BotLogger;
    use crate::{
        writers::{ChatId, Delivery, Transport, TransportError, MAX_MESSAGE_LEN},
        Context, NiceToolsError,
    };
    use std::{
        path::Path,
        sync::{Arc, Mutex},
    };

    #[derive(Clone, Default)]
    struct Inbox(Arc<Mutex<Vec<String>>>);

    impl Transport for Inbox {
        fn send_message(&self, _chat: &ChatId, text: &str) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
        fn send_document(&self, _chat: &ChatId, path: &Path) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(std::fs::read_to_string(path)?);
            Ok(())
        }
    }

    #[test]
    fn test_prefix() {
        let inbox = Inbox::default();
        let dir = temp_dir::TempDir::new().unwrap();
        let bot = BotLogger::with_transport(
            "backup",
            Box::new(inbox.clone()),
            [5_i64],
            dir.path(),
            false,
        )
        .unwrap();
        bot.log("done");
        bot.log_with("late", &Context::tagged("cron").arg(2));
        assert_eq!(
            *inbox.0.lock().unwrap(),
            vec![
                "[backup]\n\n[log] - done".to_string(),
                "[backup]\n\n[cron] - late | (2,)".to_string()
            ]
        );
    }

    #[test]
    fn test_long_message() {
        let inbox = Inbox::default();
        let dir = temp_dir::TempDir::new().unwrap();
        let bot =
            BotLogger::with_transport("b", Box::new(inbox.clone()), ["@ch"], dir.path(), true)
                .unwrap();
        let report = bot.log_and_report(&"y".repeat(MAX_MESSAGE_LEN), &Context::new());
        assert_eq!(report.delivery, Delivery::Document);
        assert!(inbox.0.lock().unwrap()[0].starts_with("[b]\n\n[log] - yyy"));
    }

    #[test]
    fn test_no_destinations() {
        let result = BotLogger::with_transport(
            "b",
            Box::new(Inbox::default()),
            Vec::<i64>::new(),
            "logs",
            false,
        );
        assert!(matches!(result, Err(NiceToolsError::MissingDestinations)));
    }
}
