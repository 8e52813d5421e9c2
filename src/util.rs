use std::{cell::Cell, io::Write};

/// Classification of the problems that `nice_tools` reports on stderr.
///
/// Logging must never bring down the program that logs, so failures during writing,
/// rotating, or delivering are not returned to the caller but printed with one of these
/// codes.
#[derive(Copy, Clone, Debug)]
pub(crate) enum ErrorCode {
    Write,
    Flush,
    Poison,
    LogFile,
    Transport,
    Attachment,
    Pool,
    Panic,
}
impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Write => "Write",
            Self::Flush => "Flush",
            Self::Poison => "Poison",
            Self::LogFile => "LogFile",
            Self::Transport => "Transport",
            Self::Attachment => "Attachment",
            Self::Pool => "Pool",
            Self::Panic => "Panic",
        }
    }
}

pub(crate) fn eprint_err(error_code: ErrorCode, msg: &str, err: &dyn std::error::Error) {
    let s = format!(
        "[nice_tools][ErrorCode::{}] {msg}, caused by {err:?}",
        error_code.as_str(),
    );
    try_to_write(&s);
}

pub(crate) fn eprint_msg(error_code: ErrorCode, msg: &str) {
    let s = format!("[nice_tools][ErrorCode::{}] {msg}", error_code.as_str());
    try_to_write(&s);
}

fn try_to_write(s: &str) {
    let w = std::io::stderr();
    let mut wl = w.lock();
    writeln!(wl, "{s}").ok();
}

// Best-effort rendering of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

pub(crate) fn poison_err(s: &'static str) -> std::io::Error {
    std::io::Error::other(s)
}

thread_local! {
    static WRITING: Cell<bool> = const { Cell::new(false) };
}

// Marks the current thread as busy with writing or delivering log output, until dropped.
//
// Records that are produced meanwhile in the same thread, e.g. by the HTTP client through
// the `log` facade, are dropped instead of being fed back into the sinks.
pub(crate) struct ReentryGuard {
    was_set: bool,
}
impl ReentryGuard {
    pub(crate) fn enter() -> Self {
        Self {
            was_set: WRITING.with(|w| w.replace(true)),
        }
    }
}
impl Drop for ReentryGuard {
    fn drop(&mut self) {
        WRITING.with(|w| w.set(self.was_set));
    }
}

pub(crate) fn is_reentrant() -> bool {
    WRITING.with(Cell::get)
}

#[cfg(test)]
mod test {
    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(super::panic_message(payload.as_ref()), "boom");

        let payload = std::panic::catch_unwind(|| panic!("{} {}", "formatted", 42)).unwrap_err();
        assert_eq!(super::panic_message(payload.as_ref()), "formatted 42");
    }

    #[test]
    fn test_reentry_guard() {
        assert!(!super::is_reentrant());
        {
            let _outer = super::ReentryGuard::enter();
            assert!(super::is_reentrant());
            {
                let _inner = super::ReentryGuard::enter();
                assert!(super::is_reentrant());
            }
            assert!(super::is_reentrant());
        }
        assert!(!super::is_reentrant());
    }
}
