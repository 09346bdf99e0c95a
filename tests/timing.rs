//! Timing-sensitive tests: delay, debounce, executor hops and blocking
//! waits. Assertions leave slack for scheduler jitter.

use std::sync::mpsc::channel;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use hydroxyl::{Executor, Observable, Options, ThreadExecutor, WaitError, WorkerExecutor};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn debounce_delivers_only_the_last_of_a_burst() {
    init_logging();
    let source = Observable::with_options(Options::NO_REPLAY);
    let debounced = source.debounce(Duration::from_millis(50));
    let seen = Arc::new(Mutex::new(vec![]));
    {
        let seen = seen.clone();
        debounced.subscribe(move |n: i32| seen.lock().unwrap().push((n, Instant::now())));
    }
    let start = Instant::now();
    source.update(1);
    thread::sleep(Duration::from_millis(10));
    source.update(2);
    thread::sleep(Duration::from_millis(10));
    source.update(3);
    thread::sleep(Duration::from_millis(150));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1, "burst must collapse to one delivery");
    let (value, delivered_at) = seen[0];
    assert_eq!(value, 3);
    assert!(delivered_at.duration_since(start) >= Duration::from_millis(70));
}

#[test]
fn debounce_separated_bursts_deliver_separately() {
    init_logging();
    let source = Observable::with_options(Options::NO_REPLAY);
    let debounced = source.debounce(Duration::from_millis(20));
    let seen = Arc::new(Mutex::new(vec![]));
    {
        let seen = seen.clone();
        debounced.subscribe(move |n: i32| seen.lock().unwrap().push(n));
    }
    source.update(1);
    thread::sleep(Duration::from_millis(80));
    source.update(2);
    thread::sleep(Duration::from_millis(80));
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[test]
fn delay_preserves_payload_and_waits() {
    init_logging();
    let executor: Arc<dyn Executor> = Arc::new(ThreadExecutor);
    let source = Observable::with_options(Options::NO_REPLAY);
    let delayed = source.delay(Duration::from_millis(40), &executor);
    let (sender, receiver) = channel();
    delayed.subscribe(move |n: i32| sender.send((n, Instant::now())).unwrap());
    let start = Instant::now();
    source.update(11);
    let (value, delivered_at) = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(value, 11);
    assert!(delivered_at.duration_since(start) >= Duration::from_millis(40));
}

#[test]
fn shorter_delays_overtake_longer_ones() {
    init_logging();
    let executor: Arc<dyn Executor> = Arc::new(ThreadExecutor);
    let source = Observable::with_options(Options::NO_REPLAY);
    let slow = source.delay(Duration::from_millis(80), &executor);
    let fast = source.delay(Duration::from_millis(10), &executor);
    let seen = Arc::new(Mutex::new(vec![]));
    for (tag, delayed) in [("slow", &slow), ("fast", &fast)].iter() {
        let tag = *tag;
        let seen = seen.clone();
        delayed.subscribe(move |_: i32| seen.lock().unwrap().push(tag));
    }
    source.update(1);
    thread::sleep(Duration::from_millis(200));
    assert_eq!(*seen.lock().unwrap(), vec!["fast", "slow"]);
}

#[test]
fn ensure_delivers_on_the_worker_thread() {
    init_logging();
    let worker: Arc<dyn Executor> = Arc::new(WorkerExecutor::new("delivery"));
    let source = Observable::with_options(Options::NO_REPLAY);
    let hopped = source.ensure(&worker);
    let (sender, receiver) = channel();
    hopped.subscribe(move |n: i32| sender.send((n, thread::current().id())).unwrap());
    source.update(1);
    source.update(2);
    let (first, first_thread) = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
    let (second, second_thread) = receiver.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!((first, second), (1, 2), "worker keeps submission order");
    assert_eq!(first_thread, second_thread);
    assert_ne!(first_thread, thread::current().id());
}

#[test]
fn wait_timeout_window() {
    init_logging();
    let silent: Observable<i32> = Observable::new();
    let start = Instant::now();
    let result = silent.wait(Some(Duration::from_millis(100)));
    let elapsed = start.elapsed();
    assert!(matches!(result, Err(WaitError::Timeout)));
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(500), "timeout overshot: {:?}", elapsed);
    // A late update into the container the wait abandoned must be harmless.
    silent.update(1);
    assert_eq!(silent.peek(), Some(1));
}

#[test]
fn wait_resumes_exactly_once_under_racing_updates() {
    init_logging();
    let source = Observable::with_options(Options::NO_REPLAY);
    let racers: Vec<_> = (0..4)
        .map(|n| {
            let source = source.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                source.update(n);
            })
        })
        .collect();
    let value = source.wait(Some(Duration::from_secs(1))).unwrap();
    assert!(value < 4);
    for racer in racers {
        racer.join().unwrap();
    }
}
