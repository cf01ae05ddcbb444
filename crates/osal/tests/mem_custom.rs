//! Custom allocation mode: every request routes through the
//! user-supplied backing allocator.

use strata_osal::mem::{self, CustomHooks, MemConfig, MemMode};
use strata_osal::status::Status;

use std::sync::atomic::{AtomicUsize, Ordering};

static ALLOCS: AtomicUsize = AtomicUsize::new(0);
static FREES: AtomicUsize = AtomicUsize::new(0);

fn backing_alloc(size: usize, user: usize) -> *mut u8 {
    assert_eq!(user, 0x5157);
    ALLOCS.fetch_add(1, Ordering::SeqCst);
    let layout = std::alloc::Layout::from_size_align(size + 16, 16).unwrap();
    unsafe {
        let raw = std::alloc::alloc(layout);
        if raw.is_null() {
            return raw;
        }
        // Stash the backing size so the free hook can rebuild the layout.
        (raw as *mut usize).write(size + 16);
        raw.add(16)
    }
}

fn backing_free(ptr: *mut u8, user: usize) {
    assert_eq!(user, 0x5157);
    FREES.fetch_add(1, Ordering::SeqCst);
    unsafe {
        let raw = ptr.sub(16);
        let total = (raw as *mut usize).read();
        let layout = std::alloc::Layout::from_size_align(total, 16).unwrap();
        std::alloc::dealloc(raw, layout);
    }
}

#[test]
fn test_custom_mode_routes_through_hooks() {
    // Custom mode without hooks is rejected outright.
    assert_eq!(
        mem::init(MemConfig {
            mode: MemMode::Custom,
            heap_size: 64 * 1024,
            custom: None,
        }),
        Err(Status::InvalidParam)
    );

    mem::init(MemConfig {
        mode: MemMode::Custom,
        heap_size: 64 * 1024,
        custom: Some(CustomHooks {
            alloc: backing_alloc,
            free: backing_free,
            user: 0x5157,
        }),
    })
    .unwrap();

    let ptr = mem::alloc(128).unwrap();
    assert_eq!(ALLOCS.load(Ordering::SeqCst), 1);
    unsafe {
        core::ptr::write_bytes(ptr.as_ptr(), 0xa5, 128);
        mem::free(Some(ptr));
    }
    assert_eq!(FREES.load(Ordering::SeqCst), 1);
    mem::check_integrity().unwrap();
}
