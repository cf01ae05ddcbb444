//! Allocator statistics round-trip in the default dynamic mode.
//!
//! Single test function: the statistics are process-global, and the
//! assertions here compare absolute free-size levels.

use strata_osal::mem;
use strata_osal::status::Status;

#[test]
fn test_dynamic_mode_round_trip_and_stats() {
    assert_eq!(mem::mode(), mem::MemMode::Dynamic);
    let initial_free = mem::get_free_size();
    let initial_min = mem::get_min_free_size();
    assert!(initial_min <= initial_free);

    // Allocate 100, fill, grow to 200, verify the prefix survives.
    let ptr = mem::alloc(100).unwrap();
    unsafe {
        for i in 0..100u8 {
            *ptr.as_ptr().add(i as usize) = i;
        }
        let grown = mem::realloc(Some(ptr), 200).unwrap();
        for i in 0..100u8 {
            assert_eq!(*grown.as_ptr().add(i as usize), i);
        }
        mem::free(Some(grown));
    }

    // Free size returns to its starting level.
    let final_free = mem::get_free_size();
    assert!(
        final_free.abs_diff(initial_free) <= 128,
        "free size drifted: {} -> {}",
        initial_free,
        final_free
    );

    // The low-water mark recorded the excursion and never rose.
    let min_free = mem::get_min_free_size();
    assert!(min_free <= initial_free - 100);
    assert!(min_free <= mem::get_free_size());

    // Watermarks recover only through an explicit reset.
    mem::reset_stats();
    assert_eq!(mem::get_min_free_size(), mem::get_free_size());

    let stats = mem::get_stats();
    assert_eq!(stats.alloc_count - stats.free_count, 0);
    assert_eq!(mem::get_allocation_count(), 0);
    mem::check_integrity().unwrap();

    // The budget is enforced.
    assert!(mem::alloc(stats.total_size + 1).is_none());
    assert!(mem::get_stats().failed_allocations > 0);

    // Late explicit init is refused.
    assert_eq!(
        mem::init(mem::MemConfig::default()),
        Err(Status::AlreadyInitialized)
    );
}
