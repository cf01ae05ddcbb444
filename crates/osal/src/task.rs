//! Task management.
//!
//! A task is a named unit of concurrent execution with a priority in
//! `0..=TASK_PRIORITY_MAX` and an explicit stack budget. On the
//! preemptive backend each task is a native thread; on the cooperative
//! backend tasks queue into the run list and execute to completion.
//!
//! Suspension is honored at suspension points only: `delay`,
//! `yield_now`, and the wait loop of every blocking primitive. A task
//! is never stopped mid-call.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use spin::RwLock;

use crate::config::TASK_PRIORITY_MAX;
use crate::diag::{self, ResourceKind};
use crate::sched::{self, BackendKind, TaskId};
use crate::status::{Result, Status};
use crate::time::Deadline;

/// Creation parameters for a task.
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    pub name: &'static str,
    /// `0..=TASK_PRIORITY_MAX`, higher runs first.
    pub priority: u8,
    /// Stack budget in bytes; must be nonzero.
    pub stack_size: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: "task",
            priority: 0,
            stack_size: 16 * 1024,
        }
    }
}

const STATE_READY: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_EXITED: u8 = 2;

struct TaskSlot {
    id: usize,
    name: &'static str,
    priority: u8,
    suspended: AtomicBool,
    state: AtomicU8,
    #[cfg(feature = "std")]
    join: spin::Mutex<Option<std::thread::JoinHandle<()>>>,
}

static TASKS: RwLock<Vec<Arc<TaskSlot>>> = RwLock::new(Vec::new());

/// Handle to a spawned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
}

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }
}

fn find(id: TaskId) -> Option<Arc<TaskSlot>> {
    TASKS.read().iter().find(|s| s.id == id.0).cloned()
}

/// Spawn a task running `entry`.
///
/// Fails with `InvalidParam` for a priority above the maximum or a
/// zero stack budget, and `NoMemory` when the backend cannot provide
/// the task resources.
pub fn spawn<F>(config: TaskConfig, entry: F) -> Result<Task>
where
    F: FnOnce() + Send + 'static,
{
    if config.priority > TASK_PRIORITY_MAX || config.stack_size == 0 {
        return Err(Status::InvalidParam);
    }

    let id = sched::alloc_task_id();
    let slot = Arc::new(TaskSlot {
        id,
        name: config.name,
        priority: config.priority,
        suspended: AtomicBool::new(false),
        state: AtomicU8::new(STATE_READY),
        #[cfg(feature = "std")]
        join: spin::Mutex::new(None),
    });
    TASKS.write().push(slot.clone());

    match sched::backend_kind() {
        BackendKind::Preemptive => {
            #[cfg(feature = "std")]
            {
                let thread_slot = slot.clone();
                let spawned = std::thread::Builder::new()
                    .name(config.name.into())
                    .stack_size(config.stack_size)
                    .spawn(move || {
                        sched::set_current(thread_slot.id);
                        thread_slot.state.store(STATE_RUNNING, Ordering::Release);
                        suspension_gate();
                        entry();
                        thread_slot.state.store(STATE_EXITED, Ordering::Release);
                    });
                match spawned {
                    Ok(handle) => {
                        *slot.join.lock() = Some(handle);
                    }
                    Err(_) => {
                        TASKS.write().retain(|s| s.id != id);
                        return Err(Status::NoMemory);
                    }
                }
            }
            #[cfg(not(feature = "std"))]
            {
                TASKS.write().retain(|s| s.id != id);
                return Err(Status::NotSupported);
            }
        }
        BackendKind::Cooperative => {
            sched::coop::enqueue(sched::coop::CoopEntry {
                id,
                name: config.name,
                priority: config.priority,
                entry: alloc::boxed::Box::new(entry),
            });
        }
    }

    diag::on_create(ResourceKind::Task);
    log::debug!(
        "task: spawned '{}' (id {}, prio {})",
        config.name,
        id,
        config.priority
    );
    Ok(Task { id: TaskId(id) })
}

/// Suspend `task` at its next suspension point.
pub fn suspend(task: &Task) -> Result<()> {
    let slot = find(task.id).ok_or(Status::NotFound)?;
    slot.suspended.store(true, Ordering::Release);
    Ok(())
}

/// Clear a pending or active suspension.
pub fn resume(task: &Task) -> Result<()> {
    let slot = find(task.id).ok_or(Status::NotFound)?;
    slot.suspended.store(false, Ordering::Release);
    Ok(())
}

/// Remove `task` from the registry.
///
/// A task that is still executing finishes its current run; deletion
/// releases the bookkeeping slot and never interrupts a call in
/// progress.
pub fn delete(task: Task) -> Result<()> {
    let slot = find(task.id).ok_or(Status::NotFound)?;
    slot.suspended.store(false, Ordering::Release);
    TASKS.write().retain(|s| s.id != task.id.0);
    diag::on_delete(ResourceKind::Task);
    Ok(())
}

/// Identity of the calling task.
pub fn current() -> TaskId {
    sched::current()
}

/// Name and priority snapshot, for diagnostics.
pub fn info(task: &Task) -> Result<(&'static str, u8)> {
    let slot = find(task.id).ok_or(Status::NotFound)?;
    Ok((slot.name, slot.priority))
}

/// Wait for a preemptive task to finish. Hosted builds only.
#[cfg(feature = "std")]
pub fn join(task: &Task) -> Result<()> {
    let slot = find(task.id).ok_or(Status::NotFound)?;
    let handle = slot.join.lock().take();
    match handle {
        Some(handle) => handle.join().map_err(|_| Status::InvalidState),
        None => Err(Status::InvalidState),
    }
}

/// Suspend the calling task for at least `ms` milliseconds.
///
/// The preemptive backend deschedules; the cooperative backend
/// busy-waits, driving the timer sweep while it spins.
pub fn delay(ms: u32) {
    suspension_gate();
    match sched::backend_kind() {
        BackendKind::Preemptive => {
            #[cfg(feature = "std")]
            std::thread::sleep(core::time::Duration::from_millis(ms as u64));
        }
        BackendKind::Cooperative => {
            let deadline = Deadline::new(ms);
            while !deadline.expired() {
                sched::relax();
            }
        }
    }
    suspension_gate();
}

/// Voluntarily give up the processor.
pub fn yield_now() {
    suspension_gate();
    sched::relax();
}

/// Park the caller while it is marked suspended. Called at every
/// suspension point.
pub(crate) fn suspension_gate() {
    let me = sched::current();
    loop {
        let suspended = TASKS
            .read()
            .iter()
            .find(|s| s.id == me.0)
            .map(|s| s.suspended.load(Ordering::Acquire))
            .unwrap_or(false);
        if !suspended {
            return;
        }
        crate::hooks::call_yield();
        #[cfg(feature = "std")]
        std::thread::sleep(core::time::Duration::from_micros(100));
    }
}

pub(crate) fn mark_exited(id: usize) {
    if let Some(slot) = TASKS.read().iter().find(|s| s.id == id) {
        slot.state.store(STATE_EXITED, Ordering::Release);
    }
}

/// True once the task's entry has returned.
pub fn has_exited(task: &Task) -> bool {
    find(task.id)
        .map(|s| s.state.load(Ordering::Acquire) == STATE_EXITED)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_validation() {
        let bad_priority = TaskConfig {
            priority: TASK_PRIORITY_MAX + 1,
            ..TaskConfig::default()
        };
        assert_eq!(spawn(bad_priority, || {}), Err(Status::InvalidParam));

        let bad_stack = TaskConfig {
            stack_size: 0,
            ..TaskConfig::default()
        };
        assert_eq!(spawn(bad_stack, || {}), Err(Status::InvalidParam));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_spawn_runs_and_joins() {
        use core::sync::atomic::AtomicBool;
        static RAN: AtomicBool = AtomicBool::new(false);

        let task = spawn(TaskConfig { name: "t-run", ..TaskConfig::default() }, || {
            RAN.store(true, Ordering::SeqCst);
        })
        .unwrap();
        join(&task).unwrap();
        assert!(RAN.load(Ordering::SeqCst));
        assert!(has_exited(&task));
        delete(task).unwrap();
    }
}
