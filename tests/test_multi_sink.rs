mod test_utils;

use nice_tools::{
    writers::{ChatId, ConsoleStream, MAX_MESSAGE_LEN},
    Context, Logger, NiceToolsError, Severity,
};
use test_utils::{read, Inbox, Sent};

#[test]
fn test_file_sink_is_uncolored() {
    let dir = temp_dir::TempDir::new().unwrap();
    let logger = Logger::builder("svc")
        .log_folder(dir.path().join("logs"))
        .colored(true)
        .console_stream(ConsoleStream::SupportCapture)
        .try_build()
        .unwrap();

    let path = logger.log_file_path().unwrap().to_path_buf();
    assert_eq!(path, dir.path().join("logs").join("svc-logs"));

    logger.debug("d");
    logger.info("Task successfully read from conf.json");
    logger.warning_with("slow", &Context::tagged("http").kwarg("ms", 1532));
    logger.error_with("failed", &Context::new().arg(1).arg("two"));
    logger.critical("down");
    logger.flush();

    let content = read(&path);
    assert!(!content.contains('\u{1b}'), "file must not contain ANSI codes");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("[svc] - "));
    assert!(lines[0].ends_with("):[DEBUG] --> [debug] - d"));
    assert!(lines[1].ends_with("):[INFO] --> [info] - Task successfully read from conf.json"));
    assert!(lines[2].ends_with("):[WARNING] --> [http] - slow | {'ms': 1532}"));
    assert!(lines[3].ends_with("):[ERROR] --> [error] - failed | (1, 'two')"));
    assert!(lines[4].ends_with("):[CRITICAL] --> [critical] - down"));
}

#[test]
fn test_level_and_template() {
    let dir = temp_dir::TempDir::new().unwrap();
    let logger = Logger::builder("lvl")
        .log_folder(dir.path())
        .level(Severity::Warning)
        .template("{levelname}|{name}|{message}")
        .console_stream(ConsoleStream::SupportCapture)
        .try_build()
        .unwrap();
    logger.debug("no");
    logger.info("no");
    logger.warning("yes");
    logger.exception("also yes");
    logger.flush();

    let content = read(logger.log_file_path().unwrap());
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("[lvl] - WARNING|lvl|[warning] - yes"));
    assert_eq!(lines.next(), Some("[lvl] - ERROR|lvl|[exception] - also yes"));
}

#[test]
fn test_exception_with_error_chain() {
    let dir = temp_dir::TempDir::new().unwrap();
    let logger = Logger::builder("exc")
        .log_folder(dir.path())
        .template("{message}")
        .console_stream(ConsoleStream::SupportCapture)
        .try_build()
        .unwrap();
    let err = std::fs::read("/surely/not/existing/file").unwrap_err();
    logger.exception_with("cannot load", &Context::new().error(&err));
    logger.flush();

    let content = read(logger.log_file_path().unwrap());
    assert!(content.starts_with("[exc] - [exception] - cannot load\nError: "));
}

#[test]
fn test_notification_sink() {
    let dir = temp_dir::TempDir::new().unwrap();
    let inbox = Inbox::default();
    let logger = Logger::builder("notify")
        .log_folder(dir.path())
        .enable_file(false)
        .transport(Box::new(inbox.clone()))
        .telegram_chat_ids([11_i64, 22])
        .telegram_async(false)
        .console_stream(ConsoleStream::SupportCapture)
        .try_build()
        .unwrap();
    assert!(logger.notifications_enabled());

    logger.info("short");
    logger.info(&"z".repeat(MAX_MESSAGE_LEN));

    let sent = inbox.sent();
    assert_eq!(sent.len(), 4);
    match &sent[0] {
        Sent::Message(chat, text) => {
            assert_eq!(*chat, ChatId::Id(11));
            assert!(text.starts_with("[INFO]\n"));
            assert!(text.ends_with(":\n\n[info] - short"));
        }
        Sent::Document(..) => panic!("short text must be sent as message"),
    }
    assert!(matches!(&sent[1], Sent::Message(chat, _) if *chat == ChatId::Id(22)));
    // the rendered notification exceeds the limit
    assert!(matches!(&sent[2], Sent::Document(chat, _) if *chat == ChatId::Id(11)));
    assert!(matches!(&sent[3], Sent::Document(chat, _) if *chat == ChatId::Id(22)));

    // attachments are cleaned up
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_failing_destination_does_not_disturb_logging() {
    let dir = temp_dir::TempDir::new().unwrap();
    let inbox = Inbox::failing_for(1_i64);
    let logger = Logger::builder("partial")
        .log_folder(dir.path())
        .transport(Box::new(inbox.clone()))
        .telegram_chat_ids([1_i64, 2, 3])
        .telegram_async(false)
        .console_stream(ConsoleStream::SupportCapture)
        .try_build()
        .unwrap();

    logger.error("first");
    logger.error("second");
    logger.flush();

    assert_eq!(inbox.sent().len(), 6);
    assert_eq!(read(logger.log_file_path().unwrap()).lines().count(), 2);
}

#[test]
fn test_implicit_enable() {
    let dir = temp_dir::TempDir::new().unwrap();

    let logger = Logger::builder("implicit")
        .log_folder(dir.path())
        .enable_file(false)
        .transport(Box::new(Inbox::default()))
        .telegram_chat_ids(["@channel"])
        .try_build()
        .unwrap();
    assert!(logger.notifications_enabled());

    let logger = Logger::builder("implicit")
        .log_folder(dir.path())
        .enable_file(false)
        .transport(Box::new(Inbox::default()))
        .try_build()
        .unwrap();
    assert!(!logger.notifications_enabled());

    assert!(matches!(
        Logger::builder("explicit")
            .log_folder(dir.path())
            .enable_telegram(true)
            .transport(Box::new(Inbox::default()))
            .try_build(),
        Err(NiceToolsError::MissingDestinations)
    ));
}

#[test]
fn test_async_notifications() {
    let dir = temp_dir::TempDir::new().unwrap();
    let inbox = Inbox::default();
    let logger = Logger::builder("async")
        .log_folder(dir.path())
        .enable_file(false)
        .transport(Box::new(inbox.clone()))
        .telegram_chat_ids([1_i64])
        .console_stream(ConsoleStream::SupportCapture)
        .try_build()
        .unwrap();

    for i in 0..5 {
        logger.warning(&format!("warning {i}"));
    }
    std::thread::sleep(std::time::Duration::from_millis(500));
    assert_eq!(inbox.sent().len(), 5);
}
