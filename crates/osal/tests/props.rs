//! Property-based invariant suite for the OSAL primitives.

use proptest::prelude::*;

use strata_osal::queue::Queue;
use strata_osal::status::{code_to_str, Status};
use strata_osal::sync::Semaphore;
use strata_osal::{mem, NO_WAIT};

proptest! {
    // Every enumerated code has a real phrase; everything else maps to
    // the fixed fallback.
    #[test]
    fn prop_status_strings_total(code in any::<u32>()) {
        let text = code_to_str(code);
        prop_assert!(!text.is_empty());
        match Status::from_code(code) {
            Some(status) => {
                prop_assert_eq!(text, status.as_str());
                prop_assert_ne!(text, "Unknown error");
            }
            None => prop_assert_eq!(text, "Unknown error"),
        }
    }

    // I + K gives and M takes leave exactly I + K - M tokens.
    #[test]
    fn prop_semaphore_count_accuracy(
        (initial, gives, takes) in (0u32..=32).prop_flat_map(|i| {
            (Just(i), 0u32..=(32 - i)).prop_flat_map(|(i, k)| {
                (Just(i), Just(k), 0u32..=(i + k))
            })
        })
    ) {
        let sem = Semaphore::create(initial, 32).unwrap();
        for _ in 0..gives {
            sem.give().unwrap();
        }
        for _ in 0..takes {
            sem.take(NO_WAIT).unwrap();
        }
        prop_assert_eq!(sem.count(), initial + gives - takes);
        sem.delete().unwrap();
    }

    // Receives replay the send sequence exactly.
    #[test]
    fn prop_queue_fifo(items in proptest::collection::vec(any::<u32>(), 1..64)) {
        let queue = Queue::create(items.len()).unwrap();
        for &item in &items {
            queue.send(item, NO_WAIT).unwrap();
        }
        for &item in &items {
            prop_assert_eq!(queue.receive(NO_WAIT).unwrap(), item);
        }
        queue.delete().unwrap();
    }

    // A queue of capacity C takes exactly C sends, and
    // len + space == C at every step.
    #[test]
    fn prop_queue_capacity(capacity in 1usize..32) {
        let queue = Queue::create(capacity).unwrap();
        for sent in 0..capacity {
            prop_assert_eq!(queue.len() + queue.space(), capacity);
            queue.send(sent as u16, NO_WAIT).unwrap();
        }
        prop_assert_eq!(queue.send(0u16, NO_WAIT), Err(Status::Full));
        prop_assert_eq!(queue.len() + queue.space(), capacity);
        queue.delete().unwrap();
    }

    // Peeking any number of times observes the front without moving it.
    #[test]
    fn prop_queue_peek_nondestructive(value in any::<u64>(), peeks in 1usize..20) {
        let queue = Queue::create(2).unwrap();
        queue.send(value, NO_WAIT).unwrap();
        for _ in 0..peeks {
            prop_assert_eq!(queue.peek().unwrap(), value);
        }
        prop_assert_eq!(queue.len(), 1);
        prop_assert_eq!(queue.receive(NO_WAIT).unwrap(), value);
        queue.delete().unwrap();
    }

    // Every byte of a calloc region is zero.
    #[test]
    fn prop_calloc_zeroes(count in 1usize..64, size in 1usize..64) {
        let ptr = mem::calloc(count, size).unwrap();
        let bytes = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), count * size) };
        prop_assert!(bytes.iter().all(|&b| b == 0));
        unsafe { mem::free(Some(ptr)) };
    }

    // Growing a region preserves its previous contents.
    #[test]
    fn prop_realloc_preserves_prefix(old in 1usize..256, extra in 0usize..256) {
        let ptr = mem::alloc(old).unwrap();
        unsafe {
            for i in 0..old {
                *ptr.as_ptr().add(i) = (i % 251) as u8;
            }
            let grown = mem::realloc(Some(ptr), old + extra).unwrap();
            for i in 0..old {
                prop_assert_eq!(*grown.as_ptr().add(i), (i % 251) as u8);
            }
            mem::free(Some(grown));
        }
    }

    // Aligned allocations land on the requested power-of-two boundary.
    #[test]
    fn prop_aligned_allocation(shift in 0u32..12, size in 1usize..512) {
        let align = 1usize << shift;
        let ptr = mem::alloc_aligned(align, size).unwrap();
        prop_assert_eq!(ptr.as_ptr() as usize % align, 0);
        unsafe { mem::free_aligned(Some(ptr)) };
    }

    // The heap stays coherent across arbitrary alloc/free interleavings.
    #[test]
    fn prop_heap_integrity(ops in proptest::collection::vec((1usize..128, any::<bool>()), 1..64)) {
        let mut live = Vec::new();
        for (size, release) in ops {
            if release && !live.is_empty() {
                let ptr = live.swap_remove(size % live.len());
                unsafe { mem::free(Some(ptr)) };
            } else if let Some(ptr) = mem::alloc(size) {
                live.push(ptr);
            }
            prop_assert!(mem::check_integrity().is_ok());
        }
        for ptr in live {
            unsafe { mem::free(Some(ptr)) };
        }
        prop_assert!(mem::check_integrity().is_ok());
    }

    // Resource watermarks never decrease while resources churn.
    #[test]
    fn prop_watermark_monotone(churn in 1usize..12) {
        let before = strata_osal::diag::snapshot();
        let mutexes: Vec<_> = (0..churn)
            .map(|_| strata_osal::sync::Mutex::create().unwrap())
            .collect();
        let during = strata_osal::diag::snapshot();
        prop_assert!(during.mutex_peak >= before.mutex_peak);
        for mutex in mutexes {
            mutex.delete().unwrap();
        }
        let after = strata_osal::diag::snapshot();
        prop_assert!(after.mutex_peak >= during.mutex_peak);
    }
}
