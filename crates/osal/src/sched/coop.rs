//! Cooperative run queue.
//!
//! Tasks spawned under the cooperative backend are queued here and
//! drained by [`run_pending`], highest priority first. Each entry runs
//! to completion on the caller's stack; a task that needs to wait does
//! so through the usual primitives, which busy-wait at suspension
//! points instead of descheduling.

use alloc::boxed::Box;
use alloc::vec::Vec;
use spin::Mutex;

pub(crate) struct CoopEntry {
    pub id: usize,
    pub name: &'static str,
    pub priority: u8,
    pub entry: Box<dyn FnOnce() + Send>,
}

static READY: Mutex<Vec<CoopEntry>> = Mutex::new(Vec::new());

pub(crate) fn enqueue(entry: CoopEntry) {
    READY.lock().push(entry);
}

/// Number of tasks waiting to run.
pub fn pending() -> usize {
    READY.lock().len()
}

/// Drain the run queue, highest priority first. Tasks enqueued by a
/// running task are picked up in the same drain. Returns the number of
/// tasks executed.
pub fn run_pending() -> usize {
    let mut executed = 0;
    loop {
        let next = {
            let mut ready = READY.lock();
            let best = ready
                .iter()
                .enumerate()
                .max_by_key(|(_, e)| e.priority)
                .map(|(i, _)| i);
            match best {
                Some(i) => ready.remove(i),
                None => break,
            }
        };
        let caller = super::current();
        super::set_current(next.id);
        log::trace!("sched: coop task '{}' running", next.name);
        (next.entry)();
        crate::task::mark_exited(next.id);
        super::set_current(caller.raw());
        executed += 1;
    }
    executed
}
