//! Cooperative backend semantics: run-to-completion tasks, busy-wait
//! delays, and tick-driven timers.

use strata_osal::queue::Queue;
use strata_osal::sched::coop;
use strata_osal::sync::Semaphore;
use strata_osal::task::{self, TaskConfig};
use strata_osal::timer::{self, TimerConfig, TimerMode};
use strata_osal::{now_ms, BackendKind, OsalConfig, Status, NO_WAIT};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

// The run queue and timer sweep are process-global; run these tests
// one at a time.
static SERIAL: StdMutex<()> = StdMutex::new(());

fn setup() -> std::sync::MutexGuard<'static, ()> {
    let _ = env_logger::builder().is_test(true).try_init();
    strata_osal::init_with(OsalConfig {
        backend: BackendKind::Cooperative,
    })
    .unwrap();
    SERIAL.lock().unwrap()
}

// Spawned tasks stay pending until the run queue drains, highest
// priority first.
#[test]
fn test_run_to_completion_priority_order() {
    let _guard = setup();
    let trace = Arc::new(AtomicU32::new(0));

    for (priority, tag) in [(1u8, 1u32), (5, 2), (3, 3)] {
        let trace = trace.clone();
        task::spawn(
            TaskConfig {
                name: "coop-task",
                priority,
                ..TaskConfig::default()
            },
            move || {
                trace
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v * 10 + tag))
                    .unwrap();
            },
        )
        .unwrap();
    }

    assert_eq!(coop::pending(), 3);
    assert_eq!(coop::run_pending(), 3);
    // Priorities 5, 3, 1 -> tags 2, 3, 1.
    assert_eq!(trace.load(Ordering::SeqCst), 231);
}

// A task spawned by a running task executes in the same drain.
#[test]
fn test_nested_spawn_runs_in_same_drain() {
    let _guard = setup();
    let ran = Arc::new(AtomicU32::new(0));

    {
        let ran = ran.clone();
        task::spawn(
            TaskConfig {
                name: "outer",
                ..TaskConfig::default()
            },
            move || {
                let inner_ran = ran.clone();
                task::spawn(
                    TaskConfig {
                        name: "inner",
                        ..TaskConfig::default()
                    },
                    move || {
                        inner_ran.fetch_add(10, Ordering::SeqCst);
                    },
                )
                .unwrap();
                ran.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();
    }

    assert_eq!(coop::run_pending(), 2);
    assert_eq!(ran.load(Ordering::SeqCst), 11);
}

// delay busy-waits on the cooperative backend but still honors the
// requested duration.
#[test]
fn test_delay_busy_waits_full_duration() {
    let _guard = setup();
    let started = now_ms();
    task::delay(30);
    let elapsed = now_ms().wrapping_sub(started);
    assert!(elapsed >= 30, "returned after {}ms", elapsed);
    assert!(elapsed <= 120, "overshot to {}ms", elapsed);
}

// NO_WAIT paths fail immediately instead of spinning.
#[test]
fn test_no_wait_paths() {
    let _guard = setup();
    let queue = Queue::<u8>::create(1).unwrap();
    assert_eq!(queue.receive(NO_WAIT), Err(Status::Empty));
    queue.send(1, NO_WAIT).unwrap();
    assert_eq!(queue.send(2, NO_WAIT), Err(Status::Full));
    queue.delete().unwrap();

    let sem = Semaphore::create_binary(0).unwrap();
    let started = now_ms();
    assert_eq!(sem.take(NO_WAIT), Err(Status::Timeout));
    assert!(now_ms().wrapping_sub(started) < 50);
    sem.delete().unwrap();
}

// A timed wait on the cooperative backend drives the timer sweep, so
// timers fire while a task blocks.
#[test]
fn test_timers_fire_during_blocking_wait() {
    let _guard = setup();
    let fired = Arc::new(AtomicU32::new(0));
    let probe = fired.clone();
    let timer = timer::create(
        TimerConfig {
            name: "coop-periodic",
            period_ms: 10,
            mode: TimerMode::Periodic,
        },
        move || {
            probe.fetch_add(1, Ordering::SeqCst);
        },
    )
    .unwrap();
    timer.start().unwrap();

    // Blocking take never succeeds; its wait loop polls the sweep.
    let sem = Semaphore::create_binary(0).unwrap();
    assert_eq!(sem.take(100), Err(Status::Timeout));

    timer.stop().unwrap();
    let count = fired.load(Ordering::SeqCst);
    assert!(count >= 4, "only {} fires during a 100ms wait", count);
    timer.delete().unwrap();
    sem.delete().unwrap();
}

// Explicit polling fires a one-shot exactly once.
#[test]
fn test_one_shot_via_poll() {
    let _guard = setup();
    let fired = Arc::new(AtomicU32::new(0));
    let probe = fired.clone();
    let timer = timer::create(
        TimerConfig {
            name: "coop-oneshot",
            period_ms: 20,
            mode: TimerMode::OneShot,
        },
        move || {
            probe.fetch_add(1, Ordering::SeqCst);
        },
    )
    .unwrap();
    timer.start().unwrap();

    let deadline = now_ms().wrapping_add(200);
    while fired.load(Ordering::SeqCst) == 0 && now_ms() < deadline {
        timer::poll();
    }
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(!timer.is_active());

    // Further polls stay quiet until restarted.
    for _ in 0..100 {
        timer::poll();
    }
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    timer.delete().unwrap();
}
