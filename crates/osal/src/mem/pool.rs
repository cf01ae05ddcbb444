//! Fixed-block memory pools.
//!
//! A pool carves a contiguous buffer into equally sized blocks tracked
//! by a bitmap. Allocation takes the lowest-index free block, so a
//! pool's layout is deterministic; release validates the pointer
//! against the pool's range and stride before touching the bitmap.
//! Pools are the only allocation source in `Static` mode.

use alloc::vec::Vec;
use core::ptr::NonNull;
use spin::Mutex;

use crate::status::{Result, Status};

const BITS_PER_WORD: usize = 32;
const POOL_ALIGN: usize = 16;

struct PoolState {
    bitmap: Vec<u32>,
    allocated: usize,
    peak: usize,
}

/// Fixed-block pool over an owned or caller-provided buffer.
pub struct MemPool {
    buffer: *mut u8,
    /// Backing size when the pool owns its buffer.
    owned_bytes: Option<usize>,
    block_size: usize,
    block_count: usize,
    state: Mutex<PoolState>,
}

// Safety: the raw buffer pointer is confined to this pool and every
// mutation goes through the state lock.
unsafe impl Send for MemPool {}
unsafe impl Sync for MemPool {}

fn build_bitmap(block_count: usize) -> Vec<u32> {
    let words = block_count.div_ceil(BITS_PER_WORD);
    let mut bitmap = alloc::vec![0u32; words];
    // Mark the tail bits of a partial last word as used so the scan
    // can never hand them out.
    let tail = block_count % BITS_PER_WORD;
    if tail != 0 {
        bitmap[words - 1] = !0u32 << tail;
    }
    bitmap
}

impl MemPool {
    /// Create a pool owning a freshly allocated buffer of
    /// `block_size * block_count` bytes.
    pub fn new(block_size: usize, block_count: usize) -> Result<MemPool> {
        if block_size == 0 || block_count == 0 {
            return Err(Status::InvalidParam);
        }
        let total = block_size
            .checked_mul(block_count)
            .ok_or(Status::InvalidSize)?;
        let layout = core::alloc::Layout::from_size_align(total, POOL_ALIGN)
            .map_err(|_| Status::InvalidSize)?;
        // Safety: total is nonzero.
        let buffer = unsafe { alloc::alloc::alloc(layout) };
        if buffer.is_null() {
            return Err(Status::NoMemory);
        }
        Ok(MemPool {
            buffer,
            owned_bytes: Some(total),
            block_size,
            block_count,
            state: Mutex::new(PoolState {
                bitmap: build_bitmap(block_count),
                allocated: 0,
                peak: 0,
            }),
        })
    }

    /// Create a pool over a caller-provided buffer. The block count is
    /// `buffer.len() / block_size`; trailing bytes are unused.
    pub fn from_static(buffer: &'static mut [u8], block_size: usize) -> Result<MemPool> {
        if block_size == 0 || buffer.len() < block_size {
            return Err(Status::InvalidParam);
        }
        let block_count = buffer.len() / block_size;
        Ok(MemPool {
            buffer: buffer.as_mut_ptr(),
            owned_bytes: None,
            block_size,
            block_count,
            state: Mutex::new(PoolState {
                bitmap: build_bitmap(block_count),
                allocated: 0,
                peak: 0,
            }),
        })
    }

    /// Take the lowest-index free block, or `None` when exhausted.
    pub fn alloc(&self) -> Option<NonNull<u8>> {
        let mut state = self.state.lock();
        for (word_index, word) in state.bitmap.iter_mut().enumerate() {
            if *word == !0u32 {
                continue;
            }
            let bit = (!*word).trailing_zeros() as usize;
            let index = word_index * BITS_PER_WORD + bit;
            *word |= 1 << bit;
            state.allocated += 1;
            state.peak = state.peak.max(state.allocated);
            // Safety: index < block_count, enforced by the bitmap tail
            // marks, so the offset stays inside the buffer.
            return NonNull::new(unsafe { self.buffer.add(index * self.block_size) });
        }
        None
    }

    /// Return a block to the pool.
    ///
    /// Rejects pointers outside the buffer or off the block stride
    /// with `InvalidParam`, and blocks that are already free with
    /// `InvalidState`.
    pub fn free(&self, ptr: NonNull<u8>) -> Result<()> {
        let addr = ptr.as_ptr() as usize;
        let base = self.buffer as usize;
        if addr < base {
            return Err(Status::InvalidParam);
        }
        let offset = addr - base;
        if offset >= self.block_size * self.block_count || offset % self.block_size != 0 {
            return Err(Status::InvalidParam);
        }
        let index = offset / self.block_size;
        let word_index = index / BITS_PER_WORD;
        let mask = 1u32 << (index % BITS_PER_WORD);

        let mut state = self.state.lock();
        if state.bitmap[word_index] & mask == 0 {
            return Err(Status::InvalidState);
        }
        state.bitmap[word_index] &= !mask;
        state.allocated -= 1;
        Ok(())
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Blocks currently handed out.
    pub fn allocated(&self) -> usize {
        self.state.lock().allocated
    }

    /// High-water mark of simultaneously allocated blocks.
    pub fn peak(&self) -> usize {
        self.state.lock().peak
    }

    pub fn free_blocks(&self) -> usize {
        self.block_count - self.allocated()
    }
}

impl Drop for MemPool {
    fn drop(&mut self) {
        if let Some(total) = self.owned_bytes {
            // Safety: (buffer, total) came from the matching alloc in
            // MemPool::new.
            unsafe {
                let layout = core::alloc::Layout::from_size_align_unchecked(total, POOL_ALIGN);
                alloc::alloc::dealloc(self.buffer, layout);
            }
        }
    }
}
