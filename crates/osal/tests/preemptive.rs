//! Concurrency tests against the preemptive (thread) backend.

use strata_osal::queue::Queue;
use strata_osal::sync::{Mutex, Semaphore};
use strata_osal::task::{self, TaskConfig};
use strata_osal::{now_ms, BackendKind, OsalConfig, NO_WAIT, WAIT_FOREVER};

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
    strata_osal::init_with(OsalConfig {
        backend: BackendKind::Preemptive,
    })
    .unwrap();
}

// At most one holder at any instant, across contending tasks.
#[test]
fn test_mutex_mutual_exclusion() {
    setup();
    let mutex = Mutex::create().unwrap();
    let holders = Arc::new(AtomicU32::new(0));
    let max_seen = Arc::new(AtomicU32::new(0));

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let mutex = mutex.clone();
            let holders = holders.clone();
            let max_seen = max_seen.clone();
            task::spawn(
                TaskConfig {
                    name: "mutex-contender",
                    priority: (i % 4) as u8,
                    ..TaskConfig::default()
                },
                move || {
                    for _ in 0..50 {
                        mutex.lock(WAIT_FOREVER).unwrap();
                        let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        task::yield_now();
                        holders.fetch_sub(1, Ordering::SeqCst);
                        mutex.unlock().unwrap();
                    }
                },
            )
            .unwrap()
        })
        .collect();

    for t in &tasks {
        task::join(t).unwrap();
    }
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    for t in tasks {
        task::delete(t).unwrap();
    }
    mutex.delete().unwrap();
}

// A giver task wakes a taker blocked on an empty semaphore.
#[test]
fn test_semaphore_blocking_handoff() {
    setup();
    let sem = Semaphore::create_counting(16, 0).unwrap();
    let received = Arc::new(AtomicU32::new(0));

    let taker = {
        let sem = sem.clone();
        let received = received.clone();
        task::spawn(
            TaskConfig {
                name: "sem-taker",
                ..TaskConfig::default()
            },
            move || {
                for _ in 0..10 {
                    sem.take(WAIT_FOREVER).unwrap();
                    received.fetch_add(1, Ordering::SeqCst);
                }
            },
        )
        .unwrap()
    };

    let giver = {
        let sem = sem.clone();
        task::spawn(
            TaskConfig {
                name: "sem-giver",
                ..TaskConfig::default()
            },
            move || {
                for _ in 0..10 {
                    task::delay(2);
                    sem.give().unwrap();
                }
            },
        )
        .unwrap()
    };

    task::join(&taker).unwrap();
    task::join(&giver).unwrap();
    assert_eq!(received.load(Ordering::SeqCst), 10);
    assert_eq!(sem.count(), 0);
    task::delete(taker).unwrap();
    task::delete(giver).unwrap();
    sem.delete().unwrap();
}

// Producer and consumer through a small queue preserve FIFO order.
#[test]
fn test_queue_fifo_under_contention() {
    setup();
    let queue = Queue::create(4).unwrap();
    const COUNT: u32 = 200;

    let producer = {
        let queue = queue.clone();
        task::spawn(
            TaskConfig {
                name: "q-producer",
                ..TaskConfig::default()
            },
            move || {
                for v in 0..COUNT {
                    queue.send(v, WAIT_FOREVER).unwrap();
                }
            },
        )
        .unwrap()
    };

    let ok = Arc::new(AtomicBool::new(true));
    let consumer = {
        let queue = queue.clone();
        let ok = ok.clone();
        task::spawn(
            TaskConfig {
                name: "q-consumer",
                ..TaskConfig::default()
            },
            move || {
                for expected in 0..COUNT {
                    let got = queue.receive(WAIT_FOREVER).unwrap();
                    if got != expected {
                        ok.store(false, Ordering::SeqCst);
                        return;
                    }
                }
            },
        )
        .unwrap()
    };

    task::join(&producer).unwrap();
    task::join(&consumer).unwrap();
    assert!(ok.load(Ordering::SeqCst), "FIFO order violated");
    assert!(queue.is_empty());
    task::delete(producer).unwrap();
    task::delete(consumer).unwrap();
    queue.delete().unwrap();
}

// Suspension takes hold at a suspension point and resume releases it.
#[test]
fn test_task_suspend_resume() {
    setup();
    let ticks = Arc::new(AtomicU32::new(0));
    let stop = Arc::new(AtomicBool::new(false));

    let worker = {
        let ticks = ticks.clone();
        let stop = stop.clone();
        task::spawn(
            TaskConfig {
                name: "suspendee",
                ..TaskConfig::default()
            },
            move || {
                while !stop.load(Ordering::SeqCst) {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    task::delay(2);
                }
            },
        )
        .unwrap()
    };

    task::delay(20);
    task::suspend(&worker).unwrap();
    task::delay(20);
    let frozen = ticks.load(Ordering::SeqCst);
    task::delay(30);
    assert_eq!(ticks.load(Ordering::SeqCst), frozen, "task ran while suspended");

    task::resume(&worker).unwrap();
    task::delay(30);
    assert!(ticks.load(Ordering::SeqCst) > frozen, "task did not resume");

    stop.store(true, Ordering::SeqCst);
    task::join(&worker).unwrap();
    task::delete(worker).unwrap();
}

// delay(T) releases inside the [T/2, 2T] envelope.
#[test]
fn test_delay_envelope() {
    setup();
    let started = now_ms();
    task::delay(50);
    let elapsed = now_ms().wrapping_sub(started);
    assert!(elapsed >= 25, "woke too early: {}ms", elapsed);
    assert!(elapsed <= 100, "woke too late: {}ms", elapsed);
}

// Timed lock on a contended mutex expires with Timeout.
#[test]
fn test_mutex_timed_contention() {
    setup();
    let mutex = Mutex::create().unwrap();
    let release = Arc::new(AtomicBool::new(false));

    let holder = {
        let mutex = mutex.clone();
        let release = release.clone();
        task::spawn(
            TaskConfig {
                name: "mutex-holder",
                ..TaskConfig::default()
            },
            move || {
                mutex.lock(WAIT_FOREVER).unwrap();
                while !release.load(Ordering::SeqCst) {
                    task::delay(1);
                }
                mutex.unlock().unwrap();
            },
        )
        .unwrap()
    };

    // Wait until the holder owns the lock.
    while !mutex.is_locked() {
        task::yield_now();
    }
    assert_eq!(mutex.lock(30), Err(strata_osal::Status::Timeout));
    assert_eq!(mutex.lock(NO_WAIT), Err(strata_osal::Status::Timeout));

    release.store(true, Ordering::SeqCst);
    task::join(&holder).unwrap();
    mutex.lock(WAIT_FOREVER).unwrap();
    mutex.unlock().unwrap();
    task::delete(holder).unwrap();
    mutex.delete().unwrap();
}
