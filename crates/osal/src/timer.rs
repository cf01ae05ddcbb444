//! Software timers.
//!
//! A timer is armed with a millisecond period and fires its callback
//! from the timer sweep: a dedicated service thread on the hosted
//! preemptive backend, or [`poll`] driven from the tick loop on the
//! cooperative one. Periodic timers re-arm from the previous deadline
//! (`deadline += period`), so firing is drift-free; a one-shot timer
//! moves to the expired state and stays inactive until restarted.
//!
//! Callbacks run outside the timer's state lock, so a callback may
//! start, stop, or re-arm its own timer.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

use crate::diag::{self, ResourceKind};
use crate::status::{Result, Status};
use crate::time;

/// Firing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fire once, then go inactive.
    OneShot,
    /// Re-arm drift-free after every expiry.
    Periodic,
}

/// Creation parameters for a timer.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub name: &'static str,
    /// Must be nonzero.
    pub period_ms: u32,
    pub mode: TimerMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running,
    ExpiredOneShot,
}

struct TimerState {
    phase: Phase,
    deadline: u32,
    period_ms: u32,
}

struct TimerInner {
    name: &'static str,
    mode: TimerMode,
    state: Mutex<TimerState>,
    callback: Box<dyn Fn() + Send + Sync>,
}

/// Handle to a software timer. Clones refer to the same timer.
#[derive(Clone)]
pub struct Timer {
    inner: Arc<TimerInner>,
}

static REGISTRY: Mutex<Vec<Arc<TimerInner>>> = Mutex::new(Vec::new());
static POLL_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Missed-deadline catch-up limit per timer and sweep.
const MAX_CATCH_UP: u32 = 64;

/// Create a stopped timer.
pub fn create<F>(config: TimerConfig, callback: F) -> Result<Timer>
where
    F: Fn() + Send + Sync + 'static,
{
    if config.period_ms == 0 {
        return Err(Status::InvalidParam);
    }
    let inner = Arc::new(TimerInner {
        name: config.name,
        mode: config.mode,
        state: Mutex::new(TimerState {
            phase: Phase::Stopped,
            deadline: 0,
            period_ms: config.period_ms,
        }),
        callback: Box::new(callback),
    });
    REGISTRY.lock().push(inner.clone());
    diag::on_create(ResourceKind::Timer);
    ensure_service();
    Ok(Timer { inner })
}

impl Timer {
    /// Arm the timer at `now + period`. Valid from any state.
    pub fn start(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        state.phase = Phase::Running;
        state.deadline = time::now_ms().wrapping_add(state.period_ms);
        Ok(())
    }

    /// Disarm a running timer. A no-op otherwise.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Running {
            state.phase = Phase::Stopped;
        }
        Ok(())
    }

    /// Re-arm the deadline at `now + period` without firing the
    /// callback. Legal from any state; leaves the timer running.
    pub fn reset(&self) -> Result<()> {
        self.start()
    }

    /// Change the period. Takes effect at the next arming; a deadline
    /// already in flight is not moved.
    pub fn set_period(&self, period_ms: u32) -> Result<()> {
        if period_ms == 0 {
            return Err(Status::InvalidParam);
        }
        self.inner.state.lock().period_ms = period_ms;
        Ok(())
    }

    /// True while armed.
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().phase == Phase::Running
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn mode(&self) -> TimerMode {
        self.inner.mode
    }

    pub fn period_ms(&self) -> u32 {
        self.inner.state.lock().period_ms
    }

    /// Destroy the timer and drop it from the sweep.
    pub fn delete(self) -> Result<()> {
        REGISTRY
            .lock()
            .retain(|t| !Arc::ptr_eq(t, &self.inner));
        diag::on_delete(ResourceKind::Timer);
        Ok(())
    }
}

/// Decide whether `timer` is due and advance its state; the callback
/// fires after the lock is dropped.
fn take_expiry(timer: &TimerInner) -> bool {
    let mut state = timer.state.lock();
    if state.phase != Phase::Running {
        return false;
    }
    if !time::reached(time::now_ms(), state.deadline) {
        return false;
    }
    match timer.mode {
        TimerMode::OneShot => {
            state.phase = Phase::ExpiredOneShot;
        }
        TimerMode::Periodic => {
            let period = state.period_ms;
            state.deadline = state.deadline.wrapping_add(period);
        }
    }
    true
}

/// Run one timer sweep, firing every due callback. Returns the number
/// of callbacks fired. Reentrant calls (a callback blocking into the
/// wait loop) are ignored.
pub fn poll() -> usize {
    if POLL_ACTIVE.swap(true, Ordering::AcqRel) {
        return 0;
    }
    let timers: Vec<Arc<TimerInner>> = REGISTRY.lock().clone();
    let mut fired = 0;
    for timer in timers {
        let mut rounds = 0;
        while take_expiry(&timer) {
            (timer.callback)();
            fired += 1;
            rounds += 1;
            if rounds >= MAX_CATCH_UP {
                log::warn!("timer: '{}' fell {} periods behind", timer.name, rounds);
                break;
            }
        }
    }
    POLL_ACTIVE.store(false, Ordering::Release);
    fired
}

/// Number of registered timers.
pub fn registered() -> usize {
    REGISTRY.lock().len()
}

#[cfg(feature = "std")]
static SERVICE_STARTED: AtomicBool = AtomicBool::new(false);

/// Start the hosted timer service thread on the preemptive backend.
/// The cooperative backend drives [`poll`] from its tick loop instead.
fn ensure_service() {
    #[cfg(feature = "std")]
    {
        if crate::sched::backend_kind() != crate::sched::BackendKind::Preemptive {
            return;
        }
        if SERVICE_STARTED.swap(true, Ordering::AcqRel) {
            return;
        }
        let spawned = std::thread::Builder::new()
            .name("osal-timer".into())
            .spawn(|| loop {
                poll();
                std::thread::sleep(core::time::Duration::from_millis(
                    crate::config::TIMER_SERVICE_PERIOD_MS as u64,
                ));
            });
        if spawned.is_err() {
            SERVICE_STARTED.store(false, Ordering::Release);
            log::error!("timer: failed to start service thread");
        } else {
            log::debug!("timer: service thread started");
        }
    }
}
