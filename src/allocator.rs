//! The public allocation surface: `Allocator<H, M>` plus the process-wide
//! locked default instance.
//!
//! The locked wrapper over a lazily-initialized instance is a
//! `LockedBuddyAllocator`-style shape (a `spin::Mutex` around the real
//! allocator) combined with a `conquer_once::spin::OnceCell` lazy-init
//! idiom, generalized from a single fixed-size kernel heap to a pair of
//! pluggable syscall sources.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;

use conquer_once::spin::OnceCell;
use spin::Mutex;

use crate::block::{align_up, BlockRef};
use crate::config::{Config, W};
use crate::error::ConfigError;
use crate::heap::Heap;
use crate::mmap::Mapper;
use crate::sys::{HeapSource, MapSource};

/// Rounds a requested payload size up to the smallest block that can hold a
/// header, the payload, and a footer, no smaller than `b_min`.
fn block_size_for(payload: usize, b_min: usize) -> usize {
    let total = align_up(payload) + 2 * W;
    core::cmp::max(total, b_min)
}

/// Owns one heap and one mapper and routes requests between them by size.
///
/// `allocate`/`free` never panic: a failed allocation returns a null
/// pointer, and freeing a null pointer is a no-op, matching the `malloc`/
/// `free` contract this crate's surface is meant to satisfy.
pub struct Allocator<H: HeapSource, M: MapSource> {
    heap: Heap<H>,
    mapper: Mapper<M>,
    config: Config,
    /// Payload addresses currently on loan, checked against I5 (distinct live
    /// payload pointers) on every allocate/free. Only kept in debug builds
    /// with `std` available, since it needs a growable collection.
    #[cfg(all(debug_assertions, feature = "std"))]
    live_payloads: std::vec::Vec<usize>,
}

impl<H: HeapSource, M: MapSource> Allocator<H, M> {
    /// Builds an allocator over the given syscall sources, rejecting a
    /// structurally invalid `config`.
    pub fn new(heap_source: H, map_source: M, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Allocator {
            heap: Heap::new(heap_source, config.heap_total_size),
            mapper: Mapper::new(map_source),
            config,
            #[cfg(all(debug_assertions, feature = "std"))]
            live_payloads: std::vec::Vec::new(),
        })
    }

    /// Returns a pointer to `size` usable bytes, or null on failure.
    /// `size == 0` always returns null without touching either backing store.
    ///
    /// Debug builds check invariants I1-I5 at the boundary of this call.
    pub fn allocate(&mut self, size: usize) -> *mut u8 {
        let ptr = if size == 0 {
            core::ptr::null_mut()
        } else {
            let block_size = block_size_for(size, self.config.b_min);

            let block = if size > self.config.mmap_threshold {
                unsafe { self.mapper.allocate(block_size) }
            } else {
                unsafe {
                    self.heap
                        .reserve(block_size, self.config.b_min, self.config.heap_growth_min)
                }
            };

            match block {
                Some(b) => {
                    debug_assert!(unsafe { b.header() }.used(), "returned block must be marked used");
                    let p = b.payload().as_ptr();
                    debug_assert_eq!(p as usize % W, 0, "payload must be word-aligned");
                    #[cfg(all(debug_assertions, feature = "std"))]
                    {
                        let addr = p as usize;
                        debug_assert!(
                            !self.live_payloads.contains(&addr),
                            "I5: payload address handed out while still live"
                        );
                        self.live_payloads.push(addr);
                    }
                    p
                }
                None => core::ptr::null_mut(),
            }
        };

        #[cfg(debug_assertions)]
        unsafe {
            self.heap.debug_check_invariants();
        }
        ptr
    }

    /// Releases a pointer previously returned by [`Allocator::allocate`].
    /// A null pointer is a no-op.
    ///
    /// Debug builds check invariants I1-I5 at the boundary of this call.
    ///
    /// # Safety
    /// `ptr` must be exactly a pointer this allocator handed out, not yet freed.
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        if let Some(payload) = NonNull::new(ptr) {
            let block = unsafe { BlockRef::from_payload(payload) };
            let mapped = unsafe { block.header() }.mapped();

            #[cfg(all(debug_assertions, feature = "std"))]
            {
                let addr = payload.as_ptr() as usize;
                let pos = self.live_payloads.iter().position(|&a| a == addr);
                debug_assert!(pos.is_some(), "I5: freeing an address not currently on loan");
                if let Some(i) = pos {
                    self.live_payloads.swap_remove(i);
                }
            }

            if mapped {
                unsafe { self.mapper.release(block) };
            } else {
                unsafe { self.heap.release(block, self.config.b_min) };
            }
        }

        #[cfg(debug_assertions)]
        unsafe {
            self.heap.debug_check_invariants();
        }
    }
}

/// A [`Allocator`] behind a spin-lock, lazily built on first use so it can
/// live in a `static` without a non-const constructor.
pub struct LockedAllocator<H: HeapSource, M: MapSource> {
    cell: OnceCell<Mutex<Allocator<H, M>>>,
    init: fn() -> Allocator<H, M>,
}

impl<H: HeapSource, M: MapSource> LockedAllocator<H, M> {
    pub const fn new(init: fn() -> Allocator<H, M>) -> Self {
        LockedAllocator {
            cell: OnceCell::uninit(),
            init,
        }
    }

    fn inner(&self) -> &Mutex<Allocator<H, M>> {
        self.cell.get_or_init(self.init)
    }
}

unsafe impl<H: HeapSource, M: MapSource> GlobalAlloc for LockedAllocator<H, M> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        debug_assert!(layout.align() <= W, "allocations wider than a word are not supported");
        self.inner().lock().allocate(layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        unsafe { self.inner().lock().free(ptr) };
    }
}

#[cfg(all(feature = "std", unix))]
mod default_instance {
    use super::LockedAllocator;
    use crate::config::Config;
    use crate::sys::unix::System;
    use crate::Allocator;

    /// The concrete allocator type backing this crate's process-wide default.
    pub type DefaultAllocator = LockedAllocator<System, System>;

    fn build_default() -> Allocator<System, System> {
        Allocator::new(System, System, Config::DEFAULT).expect("Config::DEFAULT is always valid")
    }

    /// The crate's process-wide default allocator instance, backed by the
    /// real break and real `mmap`. Tag this `#[global_allocator]` yourself,
    /// or enable the `global` feature to have this crate do it for you.
    pub static ALLOCATOR: DefaultAllocator = LockedAllocator::new(build_default);

    #[cfg(feature = "global")]
    #[global_allocator]
    static GLOBAL: DefaultAllocator = LockedAllocator::new(build_default);
}

#[cfg(all(feature = "std", unix))]
pub use default_instance::{DefaultAllocator, ALLOCATOR};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::fake::FakeSystem;

    fn test_config() -> Config {
        Config {
            heap_total_size: 4096,
            mmap_threshold: 512,
            b_min: 32,
            heap_growth_min: 256,
        }
    }

    #[test]
    fn zero_size_allocation_returns_null() {
        let mut alloc = Allocator::new(FakeSystem::new(4096), FakeSystem::new(4096), test_config())
            .expect("valid config");
        assert!(alloc.allocate(0).is_null());
    }

    #[test]
    fn free_of_null_is_a_no_op() {
        let mut alloc = Allocator::new(FakeSystem::new(4096), FakeSystem::new(4096), test_config())
            .expect("valid config");
        unsafe { alloc.free(core::ptr::null_mut()) };
    }

    #[test]
    fn small_allocation_round_trips_through_the_heap() {
        let mut alloc = Allocator::new(FakeSystem::new(4096), FakeSystem::new(4096), test_config())
            .expect("valid config");
        let ptr = alloc.allocate(64);
        assert!(!ptr.is_null());
        unsafe {
            ptr.write_bytes(0xAB, 64);
            assert_eq!(ptr.read(), 0xAB);
            alloc.free(ptr);
        }
    }

    #[test]
    fn large_allocation_routes_to_the_mapper() {
        let mut alloc = Allocator::new(FakeSystem::new(4096), FakeSystem::new(1 << 20), test_config())
            .expect("valid config");
        let ptr = alloc.allocate(4096);
        assert!(!ptr.is_null());
        unsafe {
            let block = BlockRef::from_payload(NonNull::new(ptr).unwrap());
            assert!(block.header().mapped());
            alloc.free(ptr);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = Config {
            heap_total_size: 4096,
            mmap_threshold: 512,
            b_min: 7,
            heap_growth_min: 256,
        };
        assert!(Allocator::new(FakeSystem::new(4096), FakeSystem::new(4096), bad).is_err());
    }
}
