//! Memory subsystem: mode-switched allocation with statistics and
//! integrity checking, plus fixed-block pools.
//!
//! Allocation runs in one of three modes, fixed for the life of the
//! process:
//!
//! - `Dynamic`: backed by the global allocator, bounded by the
//!   configured heap budget.
//! - `Static`: the general allocator is disabled; callers use
//!   [`pool::MemPool`] blocks carved at bring-up.
//! - `Custom`: routed through a user-supplied alloc/free pair.
//!
//! Every live allocation carries a hidden header (magic, user size,
//! backing base) ahead of the returned pointer; the header list backs
//! [`check_integrity`] and makes `free` self-validating.

pub mod pool;

pub use pool::MemPool;

use alloc::vec::Vec;
use core::ptr::NonNull;
use spin::Mutex;

use crate::config::MEM_HEAP_SIZE_DEFAULT;
use crate::error;
use crate::status::{Result, Status};

/// Allocation mode, fixed at [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemMode {
    /// Pools only; the general allocator always fails.
    Static,
    /// Global allocator within the heap budget.
    Dynamic,
    /// User-supplied backing allocator.
    Custom,
}

/// Mode adopted when no explicit [`init`] runs.
pub const MEM_MODE_DEFAULT: MemMode = MemMode::Dynamic;

/// User backing allocator for `MemMode::Custom`.
#[derive(Debug, Clone, Copy)]
pub struct CustomHooks {
    /// Returns a block of at least the requested size, or null.
    pub alloc: fn(size: usize, user: usize) -> *mut u8,
    pub free: fn(ptr: *mut u8, user: usize),
    /// Opaque token passed to both hooks.
    pub user: usize,
}

/// Memory subsystem configuration.
#[derive(Debug, Clone, Copy)]
pub struct MemConfig {
    pub mode: MemMode,
    /// Budget enforced on the sum of live user sizes.
    pub heap_size: usize,
    /// Required when `mode == MemMode::Custom`.
    pub custom: Option<CustomHooks>,
}

impl Default for MemConfig {
    fn default() -> Self {
        Self {
            mode: MEM_MODE_DEFAULT,
            heap_size: MEM_HEAP_SIZE_DEFAULT,
            custom: None,
        }
    }
}

/// Statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemStats {
    pub total_size: usize,
    pub allocated_bytes: usize,
    pub peak_bytes: usize,
    pub free_size: usize,
    pub min_free_size: usize,
    pub alloc_count: u64,
    pub free_count: u64,
    pub failed_allocations: u64,
}

struct MemContext {
    mode: MemMode,
    heap_size: usize,
    custom: Option<CustomHooks>,
}

/// Bookkeeping shared by every allocation path.
struct Book {
    live: Vec<usize>,
    allocated: usize,
    peak: usize,
    min_free: usize,
    alloc_count: u64,
    free_count: u64,
    failures: u64,
}

static CONTEXT: spin::Once<MemContext> = spin::Once::new();
static BOOK: Mutex<Option<Book>> = Mutex::new(None);

const HEADER_MAGIC: u32 = 0x4d45_4d48; // "MEMH"
const HEADER_POISON: u32 = 0x4445_4144; // "DEAD"
const HEADER_SIZE: usize = 32;
const MIN_ALIGN: usize = 16;

#[repr(C)]
struct AllocHeader {
    magic: u32,
    user_size: usize,
    /// Base address handed out by the backing allocator.
    raw: usize,
    /// Size of the backing block, for the release layout.
    total: usize,
}

const _: () = assert!(core::mem::size_of::<AllocHeader>() <= HEADER_SIZE);

fn context() -> &'static MemContext {
    CONTEXT.call_once(|| {
        let config = MemConfig::default();
        log::info!(
            "mem: defaulted to {:?} mode, {} byte budget",
            config.mode,
            config.heap_size
        );
        MemContext {
            mode: config.mode,
            heap_size: config.heap_size,
            custom: None,
        }
    })
}

fn with_book<R>(f: impl FnOnce(&mut Book, &'static MemContext) -> R) -> R {
    let ctx = context();
    let mut guard = BOOK.lock();
    let book = guard.get_or_insert_with(|| Book {
        live: Vec::new(),
        allocated: 0,
        peak: 0,
        min_free: ctx.heap_size,
        alloc_count: 0,
        free_count: 0,
        failures: 0,
    });
    f(book, ctx)
}

/// Configure the subsystem. Callable once per process; later calls
/// fail with `AlreadyInitialized`. First use without an explicit init
/// adopts the defaults.
pub fn init(config: MemConfig) -> Result<()> {
    if config.mode == MemMode::Custom && config.custom.is_none() {
        return Err(Status::InvalidParam);
    }
    if CONTEXT.is_completed() {
        return Err(Status::AlreadyInitialized);
    }
    CONTEXT.call_once(|| {
        log::info!(
            "mem: initialized in {:?} mode, {} byte budget",
            config.mode,
            config.heap_size
        );
        MemContext {
            mode: config.mode,
            heap_size: config.heap_size,
            custom: config.custom,
        }
    });
    Ok(())
}

/// Active allocation mode.
pub fn mode() -> MemMode {
    context().mode
}

fn backing_alloc(ctx: &MemContext, total: usize) -> Option<NonNull<u8>> {
    match ctx.mode {
        MemMode::Static => None,
        MemMode::Dynamic => {
            let layout = core::alloc::Layout::from_size_align(total, MIN_ALIGN).ok()?;
            // Safety: layout has nonzero size by construction.
            NonNull::new(unsafe { alloc::alloc::alloc(layout) })
        }
        MemMode::Custom => {
            let hooks = ctx.custom.as_ref()?;
            NonNull::new((hooks.alloc)(total, hooks.user))
        }
    }
}

fn backing_free(ctx: &MemContext, raw: usize, total: usize) {
    match ctx.mode {
        MemMode::Static => {}
        MemMode::Dynamic => {
            // Safety: (raw, total) came from backing_alloc with the
            // same layout parameters.
            unsafe {
                let layout = core::alloc::Layout::from_size_align_unchecked(total, MIN_ALIGN);
                alloc::alloc::dealloc(raw as *mut u8, layout);
            }
        }
        MemMode::Custom => {
            if let Some(hooks) = ctx.custom.as_ref() {
                (hooks.free)(raw as *mut u8, hooks.user);
            }
        }
    }
}

fn header_ptr(user: usize) -> *mut AllocHeader {
    (user - HEADER_SIZE) as *mut AllocHeader
}

fn alloc_impl(size: usize, align: usize) -> Option<NonNull<u8>> {
    if size == 0 || align == 0 || !align.is_power_of_two() {
        return None;
    }
    let align = align.max(MIN_ALIGN);
    with_book(|book, ctx| {
        if ctx.mode == MemMode::Static || book.allocated.saturating_add(size) > ctx.heap_size {
            book.failures += 1;
            return None;
        }
        let total = HEADER_SIZE + size + align;
        let raw = match backing_alloc(ctx, total) {
            Some(ptr) => ptr.as_ptr() as usize,
            None => {
                book.failures += 1;
                return None;
            }
        };
        let user = (raw + HEADER_SIZE + align - 1) & !(align - 1);
        debug_assert!(user + size <= raw + total);
        // Safety: the header slot lies inside the backing block and is
        // sufficiently aligned (user is at least 16-aligned).
        unsafe {
            header_ptr(user).write(AllocHeader {
                magic: HEADER_MAGIC,
                user_size: size,
                raw,
                total,
            });
        }
        book.live.push(user);
        book.allocated += size;
        book.peak = book.peak.max(book.allocated);
        book.min_free = book.min_free.min(ctx.heap_size - book.allocated);
        book.alloc_count += 1;
        NonNull::new(user as *mut u8)
    })
}

/// Allocate `size` bytes, 16-byte aligned. Zero size or an exhausted
/// budget returns `None`. Always `None` in `Static` mode.
pub fn alloc(size: usize) -> Option<NonNull<u8>> {
    alloc_impl(size, MIN_ALIGN)
}

/// Allocate and zero-fill `count * size` bytes.
pub fn calloc(count: usize, size: usize) -> Option<NonNull<u8>> {
    let total = count.checked_mul(size)?;
    let ptr = alloc_impl(total, MIN_ALIGN)?;
    // Safety: the region is owned, unaliased, and `total` bytes long.
    unsafe {
        core::ptr::write_bytes(ptr.as_ptr(), 0, total);
    }
    Some(ptr)
}

/// Allocate `size` bytes whose address is a multiple of `alignment`
/// (a nonzero power of two). Pair with [`free_aligned`].
pub fn alloc_aligned(alignment: usize, size: usize) -> Option<NonNull<u8>> {
    alloc_impl(size, alignment)
}

/// Size recorded for a live allocation.
///
/// # Safety
/// `ptr` must have come from this subsystem and not have been freed.
unsafe fn live_size(ptr: NonNull<u8>) -> Option<usize> {
    let header = &*header_ptr(ptr.as_ptr() as usize);
    if header.magic != HEADER_MAGIC {
        return None;
    }
    Some(header.user_size)
}

/// Resize an allocation, preserving the first `min(old, new)` bytes.
///
/// `None` behaves as [`alloc`]; a zero `new_size` frees and returns
/// `None`.
///
/// # Safety
/// A non-null `ptr` must have come from this subsystem and not have
/// been freed.
pub unsafe fn realloc(ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
    let old = match ptr {
        None => return alloc(new_size),
        Some(p) => p,
    };
    if new_size == 0 {
        free(Some(old));
        return None;
    }
    let old_size = match live_size(old) {
        Some(size) => size,
        None => {
            error::record_error(Status::InvalidState, old.as_ptr() as usize);
            log::error!("mem: realloc of unknown pointer {:p}", old.as_ptr());
            return None;
        }
    };
    let fresh = alloc(new_size)?;
    core::ptr::copy_nonoverlapping(old.as_ptr(), fresh.as_ptr(), old_size.min(new_size));
    free(Some(old));
    Some(fresh)
}

fn free_impl(ptr: Option<NonNull<u8>>) {
    let user = match ptr {
        None => return,
        Some(p) => p.as_ptr() as usize,
    };
    with_book(|book, ctx| {
        // Membership check first: an unknown or already-freed pointer
        // must not have its (possibly released) header touched.
        let position = match book.live.iter().position(|&p| p == user) {
            Some(i) => i,
            None => {
                error::record_error(Status::InvalidState, user);
                log::error!("mem: free of unknown or already-freed pointer {:#x}", user);
                return;
            }
        };
        // Safety: the pointer is live, so its header is intact.
        let header = unsafe { &mut *header_ptr(user) };
        if header.magic != HEADER_MAGIC {
            error::record_error(Status::Checksum, user);
            log::error!("mem: corrupt header at {:#x}", user);
            return;
        }
        book.live.swap_remove(position);
        book.allocated -= header.user_size;
        book.free_count += 1;
        header.magic = HEADER_POISON;
        backing_free(ctx, header.raw, header.total);
    });
}

/// Release an allocation. `None` is a no-op; an unknown or
/// already-freed pointer is rejected and recorded as an error.
///
/// # Safety
/// A non-null `ptr` must have come from this subsystem.
pub unsafe fn free(ptr: Option<NonNull<u8>>) {
    free_impl(ptr);
}

/// Release an aligned allocation.
///
/// # Safety
/// Same contract as [`free`].
pub unsafe fn free_aligned(ptr: Option<NonNull<u8>>) {
    free_impl(ptr);
}

/// Statistics snapshot.
pub fn get_stats() -> MemStats {
    with_book(|book, ctx| MemStats {
        total_size: ctx.heap_size,
        allocated_bytes: book.allocated,
        peak_bytes: book.peak,
        free_size: ctx.heap_size - book.allocated,
        min_free_size: book.min_free,
        alloc_count: book.alloc_count,
        free_count: book.free_count,
        failed_allocations: book.failures,
    })
}

/// Bytes left under the budget.
pub fn get_free_size() -> usize {
    get_stats().free_size
}

/// Low-water mark of the free size since the last [`reset_stats`].
pub fn get_min_free_size() -> usize {
    get_stats().min_free_size
}

/// Live allocations (`alloc_count - free_count`).
pub fn get_allocation_count() -> u64 {
    let stats = get_stats();
    stats.alloc_count - stats.free_count
}

/// Walk every live allocation and verify its header.
pub fn check_integrity() -> Result<()> {
    with_book(|book, ctx| {
        for &user in &book.live {
            // Safety: addresses in the live list were produced by
            // alloc_impl and stay valid until removed by free.
            let header = unsafe { &*header_ptr(user) };
            if header.magic != HEADER_MAGIC || header.user_size > ctx.heap_size {
                log::error!("mem: corrupt header at {:#x}", user);
                return Err(Status::Checksum);
            }
        }
        Ok(())
    })
}

/// Reset the peak and low-water marks to the current level.
pub fn reset_stats() {
    with_book(|book, ctx| {
        book.peak = book.allocated;
        book.min_free = ctx.heap_size - book.allocated;
    });
}
