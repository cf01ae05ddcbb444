//! Scheduling substrate: backend selection, task identity, and the
//! common blocking loop.
//!
//! Two execution models satisfy the same primitive contract:
//!
//! - **Preemptive** (hosted, `std`): tasks are native threads and the
//!   host scheduler preempts freely.
//! - **Cooperative**: tasks are run-to-completion entries drained by
//!   [`coop::run_pending`]; a running task keeps the CPU until it hits
//!   a suspension point, and blocking is approximated by yielding in a
//!   poll loop.
//!
//! Every blocking primitive funnels through [`block_until`], so the
//! timeout envelope and suspension behavior are uniform.

pub mod coop;

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::time::{Deadline, NO_WAIT};
use crate::{hooks, timer};

/// Execution model backing the OSAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Priority-preemptive; hosted builds map tasks onto threads.
    Preemptive,
    /// Run-to-completion task list with busy-wait blocking.
    Cooperative,
}

/// Opaque task identity. Stable for the life of the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    /// Raw numeric form, for logging.
    pub fn raw(self) -> usize {
        self.0
    }
}

static BACKEND: spin::Once<BackendKind> = spin::Once::new();

fn default_kind() -> BackendKind {
    #[cfg(feature = "std")]
    {
        BackendKind::Preemptive
    }
    #[cfg(not(feature = "std"))]
    {
        BackendKind::Cooperative
    }
}

/// Active backend; defaults on first use if `osal::init` never ran.
pub fn backend_kind() -> BackendKind {
    *BACKEND.call_once(default_kind)
}

pub(crate) fn select_backend(kind: BackendKind) {
    let selected = *BACKEND.call_once(|| kind);
    if selected != kind {
        log::warn!(
            "sched: backend already selected as {:?}, ignoring {:?}",
            selected,
            kind
        );
    }
}

static NEXT_TASK_ID: AtomicUsize = AtomicUsize::new(1);

pub(crate) fn alloc_task_id() -> usize {
    NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(feature = "std")]
std::thread_local! {
    static CURRENT: core::cell::Cell<usize> = const { core::cell::Cell::new(0) };
}

#[cfg(not(feature = "std"))]
static CURRENT_COOP: AtomicUsize = AtomicUsize::new(0);

/// Identity of the calling task.
///
/// Threads that were not spawned through the task API (the main test
/// thread, foreign threads) are lazily assigned an identity on first
/// query, so mutex ownership and critical-section nesting still work
/// for them.
pub fn current() -> TaskId {
    #[cfg(feature = "std")]
    {
        TaskId(CURRENT.with(|c| {
            if c.get() == 0 {
                c.set(alloc_task_id());
            }
            c.get()
        }))
    }
    #[cfg(not(feature = "std"))]
    {
        let id = CURRENT_COOP.load(Ordering::Relaxed);
        if id == 0 {
            let id = alloc_task_id();
            CURRENT_COOP.store(id, Ordering::Relaxed);
            return TaskId(id);
        }
        TaskId(id)
    }
}

pub(crate) fn set_current(id: usize) {
    #[cfg(feature = "std")]
    CURRENT.with(|c| c.set(id));
    #[cfg(not(feature = "std"))]
    CURRENT_COOP.store(id, Ordering::Relaxed);
}

/// One step of the wait loop: yield to the platform, and on the
/// cooperative backend drive the timer sweep so deadlines still fire
/// while a task busy-waits.
pub fn relax() {
    hooks::call_yield();
    match backend_kind() {
        BackendKind::Cooperative => {
            timer::poll();
        }
        BackendKind::Preemptive => {
            #[cfg(feature = "std")]
            std::thread::sleep(core::time::Duration::from_micros(50));
        }
    }
}

/// Poll `ready` until it reports true or `timeout_ms` elapses.
///
/// `NO_WAIT` attempts exactly once. `WAIT_FOREVER` never gives up. The
/// final re-check after expiry keeps the reported timeout honest when
/// the condition became true on the last relax.
pub fn block_until<F: FnMut() -> bool>(mut ready: F, timeout_ms: u32) -> bool {
    crate::task::suspension_gate();
    if ready() {
        return true;
    }
    if timeout_ms == NO_WAIT {
        return false;
    }
    let deadline = Deadline::new(timeout_ms);
    loop {
        relax();
        crate::task::suspension_gate();
        if ready() {
            return true;
        }
        if deadline.expired() {
            return ready();
        }
    }
}
