#![no_std]
#![allow(dead_code)]

//! A segregated free-list heap engine with boundary-tag coalescing, block
//! splitting, break-adjustment heap extension and a parallel `mmap` path
//! for large allocations.
//!
//! The engine itself ([`Allocator`]) is generic over its syscall sources
//! ([`sys::HeapSource`], [`sys::MapSource`]), so it runs unmodified against
//! a real process break and `mmap` (the `std`-gated [`sys::unix::System`])
//! or against the in-memory [`sys::fake::FakeSystem`] used by this crate's
//! own tests. With the `std` feature on unix, [`ALLOCATOR`] is a ready-made
//! process-wide instance; enable `global` to also install it as the
//! process's `#[global_allocator]`.

#[cfg(feature = "std")]
extern crate std;

pub mod allocator;
pub mod block;
pub mod config;
pub mod error;
pub mod freelist;
pub mod heap;
pub mod mmap;
pub mod sys;

mod trace;

pub use allocator::Allocator;
pub use config::Config;
pub use error::{BaseError, CanFail, ConfigError, SysError};

#[cfg(all(feature = "std", unix))]
pub use allocator::{DefaultAllocator, ALLOCATOR};

#[cfg(all(feature = "std", unix))]
use core::alloc::{GlobalAlloc, Layout};

/// Allocates `size` bytes from the process-wide default allocator, returning
/// null on failure. `size == 0` always returns null.
#[cfg(all(feature = "std", unix))]
pub fn allocate(size: usize) -> *mut u8 {
    let layout = match Layout::from_size_align(size, config::W) {
        Ok(l) => l,
        Err(_) => return core::ptr::null_mut(),
    };
    unsafe { ALLOCATOR.alloc(layout) }
}

/// Releases a pointer previously returned by [`allocate`]. A null pointer is a no-op.
///
/// # Safety
/// `ptr` must be exactly a pointer `allocate` handed out, not yet freed.
#[cfg(all(feature = "std", unix))]
pub unsafe fn free(ptr: *mut u8) {
    let layout = Layout::from_size_align(0, config::W).unwrap();
    unsafe { ALLOCATOR.dealloc(ptr, layout) };
}
