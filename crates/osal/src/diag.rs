//! Resource accounting.
//!
//! Every successful create bumps its kind's live count and high-water
//! mark; every delete drops the count only, so the watermark records
//! the worst case since the last explicit reset.

use core::sync::atomic::{AtomicU32, Ordering};

/// Kinds of OSAL resources tracked by the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Task = 0,
    Mutex = 1,
    Semaphore = 2,
    Queue = 3,
    Event = 4,
    Timer = 5,
}

const KIND_COUNT: usize = 6;

struct PerKind {
    count: AtomicU32,
    peak: AtomicU32,
}

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: PerKind = PerKind {
    count: AtomicU32::new(0),
    peak: AtomicU32::new(0),
};

static KINDS: [PerKind; KIND_COUNT] = [ZERO; KIND_COUNT];

pub(crate) fn on_create(kind: ResourceKind) {
    let slot = &KINDS[kind as usize];
    let live = slot.count.fetch_add(1, Ordering::AcqRel) + 1;
    slot.peak.fetch_max(live, Ordering::AcqRel);
}

pub(crate) fn on_delete(kind: ResourceKind) {
    let slot = &KINDS[kind as usize];
    let previous = slot.count.fetch_sub(1, Ordering::AcqRel);
    debug_assert!(previous > 0, "delete without matching create");
}

/// Counters snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OsalStats {
    pub task_count: u32,
    pub task_peak: u32,
    pub mutex_count: u32,
    pub mutex_peak: u32,
    pub sem_count: u32,
    pub sem_peak: u32,
    pub queue_count: u32,
    pub queue_peak: u32,
    pub event_count: u32,
    pub event_peak: u32,
    pub timer_count: u32,
    pub timer_peak: u32,
}

fn read(kind: ResourceKind) -> (u32, u32) {
    let slot = &KINDS[kind as usize];
    (
        slot.count.load(Ordering::Acquire),
        slot.peak.load(Ordering::Acquire),
    )
}

/// Current counts and watermarks for every kind.
pub fn snapshot() -> OsalStats {
    let (task_count, task_peak) = read(ResourceKind::Task);
    let (mutex_count, mutex_peak) = read(ResourceKind::Mutex);
    let (sem_count, sem_peak) = read(ResourceKind::Semaphore);
    let (queue_count, queue_peak) = read(ResourceKind::Queue);
    let (event_count, event_peak) = read(ResourceKind::Event);
    let (timer_count, timer_peak) = read(ResourceKind::Timer);
    OsalStats {
        task_count,
        task_peak,
        mutex_count,
        mutex_peak,
        sem_count,
        sem_peak,
        queue_count,
        queue_peak,
        event_count,
        event_peak,
        timer_count,
        timer_peak,
    }
}

/// Fold every watermark down to its current count.
pub fn reset_stats() {
    for slot in &KINDS {
        slot.peak
            .store(slot.count.load(Ordering::Acquire), Ordering::Release);
    }
}
