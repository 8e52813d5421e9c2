use nice_tools::threads::{in_thread, in_threadpool, run_in_thread, run_in_threadpool};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::sleep,
    time::{Duration, Instant},
};

#[test]
fn test_fire_and_forget_returns_immediately() {
    let done = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let done_t = Arc::clone(&done);
    run_in_thread(move || {
        sleep(Duration::from_millis(400));
        done_t.fetch_add(1, Ordering::SeqCst);
    });
    let done_p = Arc::clone(&done);
    let result = run_in_threadpool(
        move || {
            sleep(Duration::from_millis(400));
            done_p.fetch_add(1, Ordering::SeqCst);
        },
        false,
    );
    assert!(result.is_none());
    assert!(start.elapsed() < Duration::from_millis(400));
    assert_eq!(done.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(1000));
    assert_eq!(done.load(Ordering::SeqCst), 2);
}

#[test]
fn test_threadpool_result() {
    assert_eq!(run_in_threadpool(|| "result", true), Some("result"));
    let v: Vec<u64> = (1..=4)
        .filter_map(|i| run_in_threadpool(move || i * i, true))
        .collect();
    assert_eq!(v, vec![1, 4, 9, 16]);
}

#[test]
fn test_threadpool_propagates_panic() {
    let result = std::panic::catch_unwind(|| {
        run_in_threadpool(|| -> u8 { panic!("intended panic in pool job") }, true)
    });
    assert!(result.is_err());
    // the pool still works
    assert_eq!(run_in_threadpool(|| 1, true), Some(1));
}

#[test]
fn test_wrappers() {
    let counter = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&counter);
    let add_in_thread =
        in_thread(move |(a, b): (usize, usize)| c.fetch_add(a + b, Ordering::SeqCst));
    let c = Arc::clone(&counter);
    let add_in_pool = in_threadpool(move |n: usize| {
        sleep(Duration::from_millis(50));
        c.fetch_add(n, Ordering::SeqCst)
    });

    let start = Instant::now();
    add_in_thread((1, 2));
    add_in_pool(10);
    add_in_pool(20);
    assert!(start.elapsed() < Duration::from_millis(50));

    sleep(Duration::from_millis(600));
    assert_eq!(counter.load(Ordering::SeqCst), 33);
}
