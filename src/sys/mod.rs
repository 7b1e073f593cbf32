//! Syscall-equivalent abstractions.
//!
//! Everything above this module talks to `HeapSource`/`MapSource`, never to
//! `libc` directly, so the engine can be driven against
//! [`fake::FakeSystem`] in tests instead of the real process break. The
//! split keeps the boundary between the allocator and the hardware it sits
//! on in one place, the way a buddy allocator never calls a port-IO
//! routine itself either — it goes through a collaborator.

use core::ptr::NonNull;

/// Grows or shrinks the process break.
pub trait HeapSource {
    /// Requests `delta` additional bytes at the current break (or releases
    /// them, if `delta` is negative). Returns the address the break *used*
    /// to be at — the start of the newly usable span when growing — or
    /// `None` if the adjustment could not be satisfied.
    fn brk_adjust(&self, delta: isize) -> Option<NonNull<u8>>;

    /// The current break, with no side effect.
    fn current_break(&self) -> NonNull<u8>;
}

/// Obtains and releases anonymous memory mappings for the large-allocation path.
pub trait MapSource {
    /// Maps at least `bytes` of fresh, zeroed, anonymous memory.
    fn map_anon(&self, bytes: usize) -> Option<NonNull<u8>>;

    /// Releases a mapping previously returned by `map_anon`.
    ///
    /// # Safety
    /// `base`/`bytes` must exactly match a still-live mapping from this source.
    unsafe fn unmap(&self, base: NonNull<u8>, bytes: usize);

    /// The page size mappings are rounded to.
    fn page_size(&self) -> usize;
}

#[cfg(all(feature = "std", unix))]
pub mod unix;

#[cfg(any(test, feature = "std"))]
pub mod fake;
