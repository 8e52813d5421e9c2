//! Running work on background threads.
//!
//! * [`run_in_thread`] spawns a new thread per call and forgets it.
//! * [`run_in_threadpool`] hands the work to the [`shared_pool`], and optionally waits for the
//!   result.
//! * [`in_thread`] and [`in_threadpool`] wrap a function so that each call of the wrapper
//!   runs the function in the background.
//!
//! ```rust
//! use nice_tools::threads::{run_in_threadpool, in_thread};
//!
//! assert_eq!(run_in_threadpool(|| 6 * 7, true), Some(42));
//!
//! let greet = in_thread(|name: String| println!("hello {name}"));
//! greet("world".to_string()); // returns immediately
//! ```
use crate::{
    util::{eprint_err, eprint_msg, panic_message, ErrorCode},
    NiceToolsError,
};
use crossbeam_channel::{Sender, TrySendError};
use std::{
    panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
    sync::{Arc, LazyLock, Mutex, RwLock},
    thread::{Builder as ThreadBuilder, JoinHandle},
};

const WORKER: &str = "nice_tools-worker";
const BACKGROUND: &str = "nice_tools-background";

/// Default capacity of the job queue of a [`WorkerPool`].
pub const DEFAULT_QUEUE_CAPA: usize = 1024;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed number of worker threads that take jobs from a bounded queue.
///
/// A job that panics does not take its worker down; the panic is reported on stderr.
pub struct WorkerPool {
    sender: RwLock<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Starts `size` workers (at least one) that share a queue for `queue_capa` jobs.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::Io` if a worker thread cannot be spawned.
    pub fn new(size: usize, queue_capa: usize) -> Result<Self, NiceToolsError> {
        let (sender, receiver) = crossbeam_channel::bounded::<Job>(queue_capa.max(1));
        let mut workers = Vec::with_capacity(size.max(1));
        for idx in 0..size.max(1) {
            let receiver = receiver.clone();
            let handle = ThreadBuilder::new()
                .name(format!("{WORKER}-{idx}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
                            eprint_msg(
                                ErrorCode::Panic,
                                &format!(
                                    "a background job panicked: {}",
                                    panic_message(payload.as_ref())
                                ),
                            );
                        }
                    }
                })?;
            workers.push(handle);
        }
        Ok(Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.lock().map_or(0, |workers| workers.len())
    }

    /// Queues a job and returns immediately.
    ///
    /// The job's result and panics are not observable by the caller.
    /// If the queue is full or the pool is shut down, the job is dropped and this is
    /// reported on stderr.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(guard) = self.sender.read() else {
            eprint_msg(ErrorCode::Poison, "worker pool is poisoned, dropping job");
            return;
        };
        match guard.as_ref().map(|sender| sender.try_send(Box::new(job))) {
            Some(Ok(())) => {}
            Some(Err(TrySendError::Full(_))) => {
                eprint_msg(ErrorCode::Pool, "job queue is full, dropping job");
            }
            Some(Err(TrySendError::Disconnected(_))) | None => {
                eprint_msg(ErrorCode::Pool, "worker pool is shut down, dropping job");
            }
        }
    }

    /// Runs a job on the pool and waits for its result.
    ///
    /// A panic in the job is resumed in the calling thread.
    /// Calling this from within a job of the same pool can deadlock if all workers are busy.
    ///
    /// # Errors
    ///
    /// `NiceToolsError::PoolShutdown` if the pool does not accept jobs anymore.
    pub fn submit<F, T>(&self, job: F) -> Result<T, NiceToolsError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let sender = self
            .sender
            .read()
            .map_err(|_| NiceToolsError::Poison)?
            .clone()
            .ok_or(NiceToolsError::PoolShutdown)?;

        let (result_sender, result_receiver) = crossbeam_channel::bounded(1);
        sender
            .send(Box::new(move || {
                result_sender.send(catch_unwind(AssertUnwindSafe(job))).ok();
            }))
            .map_err(|_| NiceToolsError::PoolShutdown)?;

        match result_receiver.recv() {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(payload)) => resume_unwind(payload),
            Err(_) => Err(NiceToolsError::PoolShutdown),
        }
    }

    /// Stops accepting jobs, lets the workers finish the queued jobs, and joins them.
    pub fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.write() {
            sender.take();
        }
        let handles: Vec<JoinHandle<()>> = match self.workers.lock() {
            Ok(mut workers) => workers.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            handle.join().ok();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

static SHARED_POOL: LazyLock<WorkerPool> = LazyLock::new(|| {
    let size = (num_cpus::get() + 4).min(32);
    WorkerPool::new(size, DEFAULT_QUEUE_CAPA)
        .unwrap(/* yes, let's panic if the threads can't be spawned */)
});

/// The pool that is used by [`run_in_threadpool`], [`in_threadpool`],
/// and by asynchronous notifications.
///
/// Is created on first use, with `min(32, cpus + 4)` workers.
#[must_use]
pub fn shared_pool() -> &'static WorkerPool {
    &SHARED_POOL
}

/// Runs `f` in a new background thread and returns immediately.
///
/// The result of `f` is dropped; a panic in `f` ends only the background thread.
pub fn run_in_thread<F, T>(f: F)
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let builder = ThreadBuilder::new().name(BACKGROUND.to_string());
    if let Err(e) = builder.spawn(move || {
        f();
    }) {
        eprint_err(ErrorCode::Pool, "spawning a background thread failed", &e);
    }
}

/// Runs `f` on the [`shared_pool`].
///
/// With `return_result`, waits for `f` to finish and returns `Some` of its result
/// (a panic in `f` is resumed in the caller). Otherwise queues `f` and returns `None`.
pub fn run_in_threadpool<F, T>(f: F, return_result: bool) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    if return_result {
        shared_pool().submit(f).ok()
    } else {
        shared_pool().execute(move || {
            f();
        });
        None
    }
}

/// Wraps `f` such that every call of the wrapper runs `f` in a new background thread.
///
/// Multiple arguments can be passed as a tuple. The result of `f` is discarded.
#[must_use]
pub fn in_thread<A, R, F>(f: F) -> impl Fn(A) + Send + Sync + 'static
where
    F: Fn(A) -> R + Send + Sync + 'static,
    A: Send + 'static,
    R: Send + 'static,
{
    let f = Arc::new(f);
    move |args: A| {
        let f = Arc::clone(&f);
        run_in_thread(move || f(args));
    }
}

/// Wraps `f` such that every call of the wrapper queues `f` on the [`shared_pool`].
///
/// Multiple arguments can be passed as a tuple. The result of `f` is discarded.
#[must_use]
pub fn in_threadpool<A, R, F>(f: F) -> impl Fn(A) + Send + Sync + 'static
where
    F: Fn(A) -> R + Send + Sync + 'static,
    A: Send + 'static,
    R: Send + 'static,
{
    let f = Arc::new(f);
    move |args: A| {
        let f = Arc::clone(&f);
        shared_pool().execute(move || {
            f(args);
        });
    }
}

#[cfg(test)]
mod test {
    use super::{WorkerPool, DEFAULT_QUEUE_CAPA};
    use crate::NiceToolsError;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    #[test]
    fn test_submit_returns_result() {
        let pool = WorkerPool::new(2, DEFAULT_QUEUE_CAPA).unwrap();
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.submit(|| (1..=10).sum::<u32>()).unwrap(), 55);
    }

    #[test]
    fn test_execute_runs_all_jobs_before_shutdown() {
        let pool = WorkerPool::new(3, DEFAULT_QUEUE_CAPA).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_panicking_job_keeps_worker_alive() {
        let pool = WorkerPool::new(1, DEFAULT_QUEUE_CAPA).unwrap();
        pool.execute(|| panic!("intended panic in background job"));
        assert_eq!(pool.submit(|| "still alive").unwrap(), "still alive");
    }

    #[test]
    fn test_submit_resumes_panic() {
        let pool = WorkerPool::new(1, DEFAULT_QUEUE_CAPA).unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pool.submit(|| -> u8 { panic!("intended panic in submitted job") })
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_full_queue_drops_instead_of_blocking() {
        let pool = WorkerPool::new(1, 1).unwrap();
        let (release_sender, release_receiver) = crossbeam_channel::bounded::<()>(0);
        let counter = Arc::new(AtomicUsize::new(0));
        // occupy the only worker
        pool.execute(move || {
            release_receiver.recv().ok();
        });
        std::thread::sleep(Duration::from_millis(100));
        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        release_sender.send(()).unwrap();
        pool.shutdown();
        // one job fit into the queue, the others were dropped
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shut_down_pool_rejects_jobs() {
        let pool = WorkerPool::new(1, DEFAULT_QUEUE_CAPA).unwrap();
        pool.shutdown();
        assert!(matches!(
            pool.submit(|| 1),
            Err(NiceToolsError::PoolShutdown)
        ));
        pool.execute(|| {});
    }
}
