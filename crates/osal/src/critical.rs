//! Critical sections and interrupt mask emulation.
//!
//! Critical sections nest to any depth per task; the interrupt mask is
//! restored only when the outermost section exits. On hardware the
//! enter/exit pair maps to interrupt disable/restore; hosted builds
//! emulate the mask with a depth counter and serialize sections with a
//! recursive spin claim.

use core::sync::atomic::{AtomicU32, Ordering};
use spin::Mutex;

use crate::hooks;
use crate::sched;

struct CsState {
    owner: Option<usize>,
    depth: u32,
    saved_mask: u32,
}

static CS: Mutex<CsState> = Mutex::new(CsState {
    owner: None,
    depth: 0,
    saved_mask: 0,
});

static INT_DEPTH: AtomicU32 = AtomicU32::new(0);

/// Disable interrupts, returning the saved mask for
/// [`interrupt_restore`].
pub fn interrupt_disable() -> u32 {
    INT_DEPTH.fetch_add(1, Ordering::AcqRel)
}

/// Restore a mask previously returned by [`interrupt_disable`].
pub fn interrupt_restore(mask: u32) {
    INT_DEPTH.store(mask, Ordering::Release);
}

/// True while any disable is outstanding.
pub fn interrupts_disabled() -> bool {
    INT_DEPTH.load(Ordering::Acquire) > 0
}

/// Enter a critical section, waiting for any other task to leave its
/// own. Nests freely for the owning task.
pub fn enter_critical() {
    let me = sched::current().raw();
    loop {
        {
            let mut state = CS.lock();
            if state.owner.is_none() {
                state.owner = Some(me);
                state.depth = 1;
                state.saved_mask = interrupt_disable();
                return;
            }
            if state.owner == Some(me) {
                state.depth += 1;
                return;
            }
        }
        hooks::call_yield();
    }
}

/// Leave one nesting level; the outermost exit restores the interrupt
/// mask. Unbalanced exits are logged and dropped.
pub fn exit_critical() {
    let me = sched::current().raw();
    let mut state = CS.lock();
    if state.owner != Some(me) || state.depth == 0 {
        log::warn!("critical: unbalanced exit from task {}", me);
        return;
    }
    state.depth -= 1;
    if state.depth == 0 {
        state.owner = None;
        interrupt_restore(state.saved_mask);
    }
}
