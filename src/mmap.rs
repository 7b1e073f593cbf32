//! The large-allocation side path: payloads at or above the mmap threshold
//! bypass the heap entirely and live in their own anonymous mapping.
//!
//! Page-rounds against `sysconf(_SC_PAGE_SIZE)` and reuses this crate's own
//! [`Header`] encoding so a mapped block can still be told apart from a heap
//! block by its `mapped` bit alone.

use crate::block::{BlockRef, Header};
use crate::sys::MapSource;
use crate::trace::trace_event;

#[inline]
fn round_to_page(n: usize, page: usize) -> usize {
    (n + page - 1) & !(page - 1)
}

/// Owns the mapping side of the allocator; stateless beyond its `MapSource`,
/// since every mapped block carries its own size in its header.
pub struct Mapper<M> {
    sys: M,
}

impl<M: MapSource> Mapper<M> {
    pub const fn new(sys: M) -> Self {
        Mapper { sys }
    }

    /// Maps a fresh block able to hold `block_size` bytes (header included),
    /// rounded up to a whole number of pages.
    ///
    /// # Safety
    /// None beyond what `MapSource::map_anon` already requires: the returned
    /// block must eventually be passed to [`Mapper::release`], not to the
    /// heap's free path.
    pub unsafe fn allocate(&self, block_size: usize) -> Option<BlockRef> {
        let total = round_to_page(block_size, self.sys.page_size());
        let base = self.sys.map_anon(total)?;
        let block = unsafe { BlockRef::from_addr(base) };
        unsafe { block.set_header(Header::new(total, true, true)) };
        trace_event!("mmap: mapped {} bytes", total);
        Some(block)
    }

    /// Releases a block previously returned by [`Mapper::allocate`].
    ///
    /// # Safety
    /// `block` must have been returned by this mapper's `allocate` and not
    /// already released.
    pub unsafe fn release(&self, block: BlockRef) {
        let size = unsafe { block.header() }.size();
        unsafe { self.sys.unmap(block.addr(), size) };
        trace_event!("mmap: unmapped {} bytes", size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::fake::FakeSystem;

    #[test]
    fn allocate_rounds_up_to_a_page_and_tags_the_block() {
        let mapper = Mapper::new(FakeSystem::new(1 << 20));
        unsafe {
            let block = mapper.allocate(200 * 1024).expect("map failed");
            let header = block.header();
            assert!(header.used());
            assert!(header.mapped());
            assert_eq!(header.size() % 4096, 0);
            assert!(header.size() >= 200 * 1024);
            mapper.release(block);
        }
    }
}
