//! Function wrappers: a deadline for slow calls, and translation of errors into a callback
//! plus a default value.
//!
//! ```rust
//! use nice_tools::func_tools::{catch_errors, timeout};
//! use std::time::Duration;
//!
//! assert_eq!(timeout(Duration::from_secs(1), || 2 + 2).unwrap(), 4);
//!
//! let parse = catch_errors(
//!     |s: &str| s.parse::<u16>(),
//!     |e| eprintln!("not a port: {e}"),
//!     8080,
//! );
//! assert_eq!(parse("443"), 443);
//! assert_eq!(parse("https"), 8080);
//! ```
use crate::NiceToolsError;
use crossbeam_channel::RecvTimeoutError;
use std::{
    panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
    sync::Arc,
    thread::Builder as ThreadBuilder,
    time::Duration,
};

/// Message of the [`NiceToolsError::Timeout`] that [`timeout`] returns.
pub const DEFAULT_TIMEOUT_MESSAGE: &str = "Timed Out!";

const DEADLINE: &str = "nice_tools-deadline";

/// Runs `f` on a helper thread and waits at most `duration` for its result.
///
/// Every call has its own timer, so deadlines can be nested and used from several
/// threads at once. A panic in `f` is resumed in the caller.
///
/// # Errors
///
/// `NiceToolsError::Timeout` with message `"Timed Out!"` if `f` does not finish in time;
/// `f` then continues in the background, as threads cannot be cancelled.
/// `NiceToolsError::Io` if the helper thread cannot be spawned.
pub fn timeout<F, T>(duration: Duration, f: F) -> Result<T, NiceToolsError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    timeout_with_message(duration, DEFAULT_TIMEOUT_MESSAGE, f)
}

/// Like [`timeout`], with a custom message for the timeout error.
///
/// # Errors
///
/// `NiceToolsError::Timeout` with the given message if `f` does not finish in time,
/// `NiceToolsError::Io` if the helper thread cannot be spawned.
pub fn timeout_with_message<F, T>(
    duration: Duration,
    message: &str,
    f: F,
) -> Result<T, NiceToolsError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (sender, receiver) = crossbeam_channel::bounded(1);
    ThreadBuilder::new()
        .name(DEADLINE.to_string())
        .spawn(move || {
            // the receiver is gone if the deadline has passed
            sender.send(catch_unwind(AssertUnwindSafe(f))).ok();
        })?;

    match receiver.recv_timeout(duration) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(payload)) => resume_unwind(payload),
        Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
            Err(NiceToolsError::Timeout(message.to_string()))
        }
    }
}

/// Wraps `f` into a function that applies [`timeout_with_message`] to each call.
///
/// Multiple arguments can be passed as a tuple.
#[must_use]
pub fn with_timeout<A, T, F>(
    duration: Duration,
    message: &str,
    f: F,
) -> impl Fn(A) -> Result<T, NiceToolsError>
where
    F: Fn(A) -> T + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    let f = Arc::new(f);
    let message = message.to_string();
    move |args: A| {
        let f = Arc::clone(&f);
        timeout_with_message(duration, &message, move || f(args))
    }
}

/// Wraps a fallible function: errors are handed to `callback`, and `default` is returned
/// instead.
#[must_use]
pub fn catch_errors<A, T, E, F, C>(f: F, callback: C, default: T) -> impl Fn(A) -> T
where
    F: Fn(A) -> Result<T, E>,
    C: Fn(&E),
    T: Clone,
{
    move |args: A| match f(args) {
        Ok(result) => result,
        Err(e) => {
            callback(&e);
            default.clone()
        }
    }
}

/// Like [`catch_errors`], but only errors for which `filter` returns `true` are caught;
/// all other errors are returned unchanged.
#[must_use]
pub fn catch_errors_if<A, T, E, F, P, C>(
    f: F,
    filter: P,
    callback: C,
    default: T,
) -> impl Fn(A) -> Result<T, E>
where
    F: Fn(A) -> Result<T, E>,
    P: Fn(&E) -> bool,
    C: Fn(&E),
    T: Clone,
{
    move |args: A| match f(args) {
        Ok(result) => Ok(result),
        Err(e) if filter(&e) => {
            callback(&e);
            Ok(default.clone())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod test {
    use super::{catch_errors, catch_errors_if, timeout, with_timeout};
    use crate::NiceToolsError;
    use std::{cell::RefCell, io, thread::sleep, time::Duration};

    #[test]
    fn test_timeout() {
        assert_eq!(timeout(Duration::from_millis(500), || "fast").unwrap(), "fast");

        match timeout(Duration::from_millis(50), || {
            sleep(Duration::from_millis(500));
        }) {
            Err(NiceToolsError::Timeout(msg)) => assert_eq!(msg, "Timed Out!"),
            _ => panic!("expected a timeout"),
        }
    }

    #[test]
    fn test_nested_timeouts() {
        let result = timeout(Duration::from_millis(500), || {
            timeout(Duration::from_millis(20), || sleep(Duration::from_millis(300)))
        })
        .unwrap();
        assert!(matches!(result, Err(NiceToolsError::Timeout(_))));
    }

    #[test]
    fn test_with_timeout() {
        let slow_square = with_timeout(Duration::from_millis(100), "too slow", |x: u64| {
            sleep(Duration::from_millis(x));
            x * x
        });
        assert_eq!(slow_square(3).unwrap(), 9);
        match slow_square(400) {
            Err(e) => assert_eq!(e.to_string(), "too slow"),
            Ok(_) => panic!("expected a timeout"),
        }
    }

    #[test]
    fn test_timeout_resumes_panic() {
        let result = std::panic::catch_unwind(|| {
            timeout(Duration::from_secs(1), || -> u8 { panic!("intended panic") })
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_catch_errors() {
        let seen = RefCell::new(Vec::new());
        let parse = catch_errors(
            |s: &str| s.parse::<i32>(),
            |e| seen.borrow_mut().push(e.to_string()),
            -1,
        );
        assert_eq!(parse("17"), 17);
        assert_eq!(parse("x"), -1);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_catch_errors_if() {
        let calls = RefCell::new(0);
        let read = catch_errors_if(
            |kind: io::ErrorKind| -> io::Result<&'static str> {
                Err(io::Error::new(kind, "failed"))
            },
            |e| e.kind() == io::ErrorKind::NotFound,
            |_| *calls.borrow_mut() += 1,
            "default",
        );
        assert_eq!(read(io::ErrorKind::NotFound).unwrap(), "default");
        assert_eq!(
            read(io::ErrorKind::PermissionDenied).unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
        assert_eq!(*calls.borrow(), 1);
    }
}
