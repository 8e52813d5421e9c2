use crate::{
    formats::DEFAULT_NOTIFICATION_TEMPLATE,
    threads::shared_pool,
    util::{eprint_err, eprint_msg, ErrorCode, ReentryGuard},
    writers::{ChatId, LogWriter, Transport, TransportError},
    DeferredNow, LogRecord, Template,
};
use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Texts with more characters than this are sent as document attachment.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// How a text is delivered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// As plain chat message.
    Message,
    /// As text file attachment.
    Document,
}

impl Delivery {
    /// Chooses the delivery mode for a text, based on its length in characters.
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        if text.chars().count() > MAX_MESSAGE_LEN {
            Self::Document
        } else {
            Self::Message
        }
    }
}

/// Outcome of delivering one text to all destinations.
#[derive(Debug)]
pub struct DeliveryReport {
    /// How the text was delivered.
    pub delivery: Delivery,
    /// Number of destinations that accepted the text.
    pub delivered: usize,
    /// The destinations that failed, with their errors.
    pub failures: Vec<(ChatId, TransportError)>,
}

impl DeliveryReport {
    fn new(delivery: Delivery) -> Self {
        Self {
            delivery,
            delivered: 0,
            failures: Vec::new(),
        }
    }

    fn account(&mut self, chat: &ChatId, result: Result<(), TransportError>) {
        match result {
            Ok(()) => self.delivered += 1,
            Err(e) => self.failures.push((chat.clone(), e)),
        }
    }

    /// `true` if every destination accepted the text.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn report(&self) {
        if self.failures.is_empty() {
            return;
        }
        let mut msg = format!(
            "delivery failed for {} of {} destinations:",
            self.failures.len(),
            self.failures.len() + self.delivered
        );
        for (chat, e) in &self.failures {
            write!(msg, "\n  {chat}: {e}").ok();
        }
        eprint_msg(ErrorCode::Transport, &msg);
    }
}

struct Inner {
    transport: Box<dyn Transport>,
    chat_ids: Vec<ChatId>,
    attachment_dir: PathBuf,
}

impl Inner {
    fn deliver(&self, text: &str) -> DeliveryReport {
        let _guard = ReentryGuard::enter();
        let delivery = Delivery::for_text(text);
        let mut report = DeliveryReport::new(delivery);
        match delivery {
            Delivery::Message => {
                for chat in &self.chat_ids {
                    report.account(chat, self.transport.send_message(chat, text));
                }
            }
            Delivery::Document => {
                let path = match write_attachment(&self.attachment_dir, text) {
                    Ok(path) => path,
                    Err(e) => {
                        eprint_err(ErrorCode::Attachment, "cannot write attachment", &e);
                        for chat in &self.chat_ids {
                            report
                                .failures
                                .push((chat.clone(), TransportError::Io(clone_io_error(&e))));
                        }
                        return report;
                    }
                };
                for chat in &self.chat_ids {
                    report.account(chat, self.transport.send_document(chat, &path));
                }
                if let Err(e) = std::fs::remove_file(&path) {
                    eprint_err(ErrorCode::Attachment, "cannot remove attachment", &e);
                }
            }
        }
        report.report();
        report
    }
}

fn clone_io_error(e: &std::io::Error) -> std::io::Error {
    std::io::Error::new(e.kind(), e.to_string())
}

// Writes the text to "<dir>/<8 hex chars>-logs.txt", creating the folder if necessary.
fn write_attachment(dir: &Path, text: &str) -> Result<PathBuf, std::io::Error> {
    std::fs::create_dir_all(dir)?;
    let token = uuid::Uuid::new_v4().simple().to_string();
    let path = dir.join(format!("{}-logs.txt", &token[..8]));
    std::fs::write(&path, text)?;
    Ok(path)
}

/// Delivers texts to every configured chat, as message or, for long texts, as document.
///
/// Delivery failures are reported on stderr and never returned to the caller of
/// [`send`](Notifier::send). If one destination fails, the remaining ones are still served.
///
/// With asynchronous dispatch, the delivery runs as fire-and-forget job on the
/// [`shared_pool`](crate::threads::shared_pool); otherwise it runs in the calling thread.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
    run_async: bool,
}

impl Notifier {
    /// Creates a notifier.
    ///
    /// Attachments for long texts are written to `attachment_dir`, which is created
    /// when needed; each attachment file is removed after its delivery.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(
        transport: Box<dyn Transport>,
        chat_ids: Vec<ChatId>,
        attachment_dir: P,
        run_async: bool,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                chat_ids,
                attachment_dir: attachment_dir.into(),
            }),
            run_async,
        }
    }

    /// The configured destinations.
    #[must_use]
    pub fn chat_ids(&self) -> &[ChatId] {
        &self.inner.chat_ids
    }

    /// `true` if deliveries run on the worker pool.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.run_async
    }

    /// Delivers the text to all destinations, according to the dispatch mode.
    pub fn send(&self, text: String) {
        if self.run_async {
            let inner = Arc::clone(&self.inner);
            shared_pool().execute(move || {
                inner.deliver(&text);
            });
        } else {
            self.inner.deliver(&text);
        }
    }

    /// Delivers the text to all destinations in the calling thread and reports the outcome.
    ///
    /// Failures are also reported on stderr.
    #[must_use]
    pub fn deliver(&self, text: &str) -> DeliveryReport {
        self.inner.deliver(text)
    }
}

/// A [`LogWriter`] that sends each record as notification.
///
/// Records are rendered with their own template, by default
/// `"[{levelname}]\n{lineno} - {filename}:\n\n{message}"`, without colors.
pub struct NotificationWriter {
    template: Template,
    notifier: Notifier,
}

impl NotificationWriter {
    /// Creates a writer with the default notification template.
    #[must_use]
    pub fn new(notifier: Notifier) -> Self {
        Self {
            template: Template::parse(DEFAULT_NOTIFICATION_TEMPLATE)
                .unwrap(/* the default template is valid */),
            notifier,
        }
    }

    /// Uses the given template instead of the default notification template.
    #[must_use]
    pub fn template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// The underlying notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

impl LogWriter for NotificationWriter {
    fn write(&self, now: &mut DeferredNow, record: &LogRecord) -> std::io::Result<()> {
        let mut text = String::with_capacity(record.message().len() + 64);
        self.template.render(&mut text, now, record);
        self.notifier.send(text);
        Ok(())
    }

    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }
}
