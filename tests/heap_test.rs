//! End-to-end scenarios against the public `Allocator` surface, driven by
//! the in-memory `FakeSystem` so the break and mmap never have to be real:
//! one function per scenario, exercising the allocator the way a caller
//! actually would rather than poking at its internals.

use core::ptr::NonNull;

use fzmalloc::config::Config;
use fzmalloc::sys::fake::FakeSystem;
use fzmalloc::Allocator;

fn small_heap_config() -> Config {
    Config {
        heap_total_size: 256,
        mmap_threshold: 4096,
        b_min: 32,
        heap_growth_min: 256,
    }
}

#[test]
fn basic_allocation_is_writable_and_word_aligned() {
    let mut alloc = Allocator::new(FakeSystem::new(1 << 16), FakeSystem::new(1 << 20), small_heap_config())
        .expect("valid config");

    let ptr = alloc.allocate(100);
    assert!(!ptr.is_null());
    assert_eq!(ptr as usize % core::mem::size_of::<usize>(), 0);
    unsafe {
        ptr.write_bytes(0x5a, 100);
        for i in 0..100 {
            assert_eq!(*ptr.add(i), 0x5a);
        }
        alloc.free(ptr);
    }
}

#[test]
fn freed_block_is_reused_by_a_same_sized_request() {
    let mut alloc = Allocator::new(FakeSystem::new(1 << 16), FakeSystem::new(1 << 20), small_heap_config())
        .expect("valid config");

    let a = alloc.allocate(48);
    unsafe { alloc.free(a) };
    let b = alloc.allocate(48);
    assert_eq!(a, b);
}

#[test]
fn freeing_adjacent_blocks_lets_a_larger_request_fit() {
    let mut alloc = Allocator::new(FakeSystem::new(1 << 16), FakeSystem::new(1 << 20), small_heap_config())
        .expect("valid config");

    let a = alloc.allocate(48);
    let b = alloc.allocate(48);
    unsafe {
        alloc.free(a);
        alloc.free(b);
    }
    // Bigger than either block alone, but small enough to fit the two
    // coalesced blocks plus their shared header/footer overhead.
    let merged = alloc.allocate(48 + 48 + 16);
    assert_eq!(merged, a);
}

#[test]
fn large_request_bypasses_the_heap_via_mmap() {
    let mut alloc = Allocator::new(FakeSystem::new(1 << 16), FakeSystem::new(1 << 20), small_heap_config())
        .expect("valid config");

    let ptr = alloc.allocate(8192);
    assert!(!ptr.is_null());
    unsafe {
        let block = fzmalloc::block::BlockRef::from_payload(NonNull::new(ptr).unwrap());
        assert!(block.header().mapped());
        alloc.free(ptr);
    }
}

#[test]
fn exhausting_one_extension_triggers_another() {
    let mut alloc = Allocator::new(FakeSystem::new(1 << 20), FakeSystem::new(1 << 20), small_heap_config())
        .expect("valid config");

    // Each request is small enough to stay on the heap path but the run as a
    // whole exceeds a single growth step, forcing at least one more `brk`.
    let mut ptrs = alloc_n(&mut alloc, 64, 40);
    for ptr in ptrs.drain(..) {
        assert!(!ptr.is_null());
        unsafe { alloc.free(ptr) };
    }
}

fn alloc_n(alloc: &mut Allocator<FakeSystem, FakeSystem>, size: usize, n: usize) -> std::vec::Vec<*mut u8> {
    (0..n).map(|_| alloc.allocate(size)).collect()
}

#[test]
fn repeated_growth_through_the_public_surface_never_misreports_a_gap() {
    // FakeSystem's arena is contiguous by construction, so a genuine gap
    // can't be provoked through this public surface; the gap-bridging branch
    // itself is exercised directly against a scripted, deliberately
    // non-contiguous `HeapSource` in `heap`'s own unit tests. This test only
    // covers the adjacent case: many small extensions in a row, none of
    // which may ever be treated as a gap.
    let mut alloc = Allocator::new(FakeSystem::new(1 << 20), FakeSystem::new(1 << 20), small_heap_config())
        .expect("valid config");

    for _ in 0..8 {
        let ptr = alloc.allocate(96);
        assert!(!ptr.is_null());
    }
}
