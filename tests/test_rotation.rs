mod test_utils;

use nice_tools::{
    writers::{FileLogWriter, LogWriter},
    DeferredNow, LogRecord, MessageFormatter, Schedule, Severity, When,
};
use std::{thread::sleep, time::Duration};
use test_utils::read;

fn write(writer: &FileLogWriter, msg: &str) {
    let record = LogRecord::new(Severity::Info, "rot", msg, file!(), line!());
    writer.write(&mut DeferredNow::new(), &record).unwrap();
}

#[test]
fn test_rotation_every_second_with_cleanup() {
    let dir = temp_dir::TempDir::new().unwrap();
    let writer = FileLogWriter::builder(dir.path(), "rot-logs")
        .schedule(Schedule::new(When::Second, 1))
        .backup_count(2)
        .format(MessageFormatter::new("rot", "{message}", false).unwrap())
        .try_build()
        .unwrap();

    for i in 0..4 {
        write(&writer, &format!("line {i}"));
        sleep(Duration::from_millis(1100));
    }
    write(&writer, "last");
    writer.flush().unwrap();

    let rotated = writer.rotated_files().unwrap();
    assert_eq!(rotated.len(), 2);
    assert_eq!(read(&rotated[0]), "[rot] - line 2\n");
    assert_eq!(read(&rotated[1]), "[rot] - line 3\n");
    assert_eq!(read(&writer.current_path().unwrap()), "[rot] - last\n");
    for path in &rotated {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        // rot-logs.YYYY-mm-dd_HH-MM-SS
        assert_eq!(name.len(), "rot-logs.".len() + 19, "unexpected name {name}");
    }
}

#[test]
fn test_keep_all_and_trigger() {
    let dir = temp_dir::TempDir::new().unwrap();
    let writer = FileLogWriter::builder(dir.path(), "all-logs")
        .schedule("S".parse().unwrap())
        .backup_count(0)
        .try_build()
        .unwrap();

    for i in 0..3 {
        write(&writer, &format!("line {i}"));
        sleep(Duration::from_millis(1100));
        writer.trigger_rotation().unwrap();
    }
    assert_eq!(writer.rotated_files().unwrap().len(), 3);
}

#[test]
fn test_restart_appends() {
    let dir = temp_dir::TempDir::new().unwrap();
    for msg in ["before restart", "after restart"] {
        let writer = FileLogWriter::builder(dir.path(), "app-logs")
            .format(MessageFormatter::new("app", "{message}", false).unwrap())
            .try_build()
            .unwrap();
        write(&writer, msg);
        writer.shutdown();
    }
    assert_eq!(
        read(&dir.path().join("app-logs")),
        "[app] - before restart\n[app] - after restart\n"
    );
}
