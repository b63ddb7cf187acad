// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contracts the translation core exchanges with its external collaborators.
//!
//! None of these traits describe how a real system implements them (page
//! tables, UART, hunk-format ROM loading and cache-line flush/invalidate are
//! all out of scope here, see the crate's top-level documentation) — they
//! only describe the shape of the interface the core consumes, so the
//! engine can be exercised with in-memory fakes in tests.

/// A pointer to a sequence of big-endian 16-bit guest opcode words and an
/// upper bound. The core only ever reads through this trait, never writes.
pub trait GuestReader {
    /// Reads the big-endian 16-bit guest word at `guest_addr`, or `None` if
    /// `guest_addr` lies outside the readable window.
    fn read_word(&self, guest_addr: u32) -> Option<u16>;
}

/// A slice-backed [`GuestReader`], the fake used throughout this crate's
/// tests and by any embedder that keeps the guest ROM/RAM in a flat buffer.
pub struct SliceGuestReader<'a> {
    words: &'a [u16],
    base: u32,
}

impl<'a> SliceGuestReader<'a> {
    /// Creates a reader over `words` (big-endian guest words, already
    /// decoded to host `u16`s) addressed starting at `base`.
    pub fn new(words: &'a [u16], base: u32) -> Self {
        Self { words, base }
    }
}

impl GuestReader for SliceGuestReader<'_> {
    fn read_word(&self, guest_addr: u32) -> Option<u16> {
        let offset = guest_addr.checked_sub(self.base)? / 2;
        self.words.get(offset as usize).copied()
    }
}

/// A bump/pool allocator exposing `alloc`/`free`. Two independent instances
/// back the host-instruction stream (execute-permitted memory) and
/// translator bookkeeping respectively; the core never assumes they share
/// an address space.
pub trait Allocator {
    /// Allocates `size` bytes aligned to `align`, or `None` if the
    /// allocator has no room left.
    fn alloc(&mut self, size: usize, align: usize) -> Option<*mut u8>;

    /// Releases a block previously returned by `alloc`.
    ///
    /// # Safety
    /// `ptr` must have been returned by a prior `alloc` on the same
    /// allocator instance and not already freed.
    unsafe fn free(&mut self, ptr: *mut u8);
}

/// The two-operation cache-maintenance interface consumed at block
/// finalization, before the block is handed to the dispatch runtime.
pub trait CacheMaintenance {
    /// Cleans the data cache to the point of unification over
    /// `[addr, addr + length)`.
    fn clean_data_cache(&self, addr: *const u8, length: usize);

    /// Invalidates the instruction cache to the point of unification over
    /// the same range, after the data-cache clean has completed.
    fn invalidate_instruction_cache(&self, addr: *const u8, length: usize);

    /// Performs the full maintenance sequence required before control can
    /// safely transfer into a freshly emitted block: clean data cache, then
    /// invalidate instruction cache, establishing the happens-before edge
    /// the dispatch runtime relies on.
    fn finish_block(&self, addr: *const u8, length: usize) {
        self.clean_data_cache(addr, length);
        self.invalidate_instruction_cache(addr, length);
    }
}

/// A fixed-capacity bump [`Allocator`]: hands out monotonically increasing
/// offsets into an owned buffer and never reclaims them. `free` is a
/// documented no-op — bump allocators of this shape are meant to back a
/// single translation unit's worth of code or bookkeeping and be reset or
/// discarded wholesale by the embedder, not have individual blocks reclaimed.
pub struct BumpAllocator {
    buffer: Vec<u8>,
    used: usize,
}

impl BumpAllocator {
    pub fn new(capacity: usize) -> Self {
        Self { buffer: vec![0; capacity], used: 0 }
    }
}

impl Allocator for BumpAllocator {
    fn alloc(&mut self, size: usize, align: usize) -> Option<*mut u8> {
        let base = self.buffer.as_mut_ptr() as usize;
        let aligned = (base + self.used).next_multiple_of(align.max(1));
        let padding = aligned - (base + self.used);
        let end = self.used.checked_add(padding)?.checked_add(size)?;
        if end > self.buffer.len() {
            return None;
        }
        self.used = end;
        // SAFETY: `aligned` is within `[base, base + buffer.len())`, which
        // is the single allocation backing `self.buffer`.
        Some(aligned as *mut u8)
    }

    /// No-op: see the struct-level doc comment.
    unsafe fn free(&mut self, _ptr: *mut u8) {}
}

/// A [`CacheMaintenance`] that performs no cache maintenance at all, for
/// hosted test environments where the emitted code is never actually
/// executed and no real instruction cache exists to invalidate.
pub struct NullCacheMaintenance;

impl CacheMaintenance for NullCacheMaintenance {
    fn clean_data_cache(&self, _addr: *const u8, _length: usize) {}
    fn invalidate_instruction_cache(&self, _addr: *const u8, _length: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_guest_reader_reads_in_window() {
        let words = [0x4E71u16, 0x7001, 0x4E75];
        let reader = SliceGuestReader::new(&words, 0x1000);
        assert_eq!(reader.read_word(0x1000), Some(0x4E71));
        assert_eq!(reader.read_word(0x1002), Some(0x7001));
        assert_eq!(reader.read_word(0x1004), Some(0x4E75));
    }

    #[test]
    fn slice_guest_reader_rejects_out_of_window() {
        let words = [0x4E71u16];
        let reader = SliceGuestReader::new(&words, 0x1000);
        assert_eq!(reader.read_word(0x0FFE), None);
        assert_eq!(reader.read_word(0x1002), None);
    }

    #[test]
    fn bump_allocator_hands_out_increasing_non_overlapping_regions() {
        let mut alloc = BumpAllocator::new(64);
        let a = alloc.alloc(16, 4).unwrap();
        let b = alloc.alloc(16, 4).unwrap();
        assert!((b as usize) >= (a as usize) + 16);
    }

    #[test]
    fn bump_allocator_reports_exhaustion() {
        let mut alloc = BumpAllocator::new(8);
        assert!(alloc.alloc(4, 4).is_some());
        assert!(alloc.alloc(16, 4).is_none());
    }

    #[test]
    fn bump_allocator_respects_alignment() {
        let mut alloc = BumpAllocator::new(64);
        let _ = alloc.alloc(1, 1).unwrap();
        let aligned = alloc.alloc(4, 16).unwrap();
        assert_eq!(aligned as usize % 16, 0);
    }

    #[test]
    fn null_cache_maintenance_finish_block_does_not_panic() {
        let cache = NullCacheMaintenance;
        cache.finish_block(std::ptr::null(), 0);
    }
}
