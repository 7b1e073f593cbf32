//! The real syscall layer, backed by `libc`: `sbrk` for the break, `mmap`/
//! `munmap`/`sysconf` for anonymous mappings.

use core::ptr::NonNull;

use super::{HeapSource, MapSource};

/// The process's real break and the kernel's real mmap/munmap.
#[derive(Debug, Default, Clone, Copy)]
pub struct System;

impl HeapSource for System {
    fn brk_adjust(&self, delta: isize) -> Option<NonNull<u8>> {
        let prev = unsafe { libc::sbrk(delta) };
        if prev == usize::MAX as *mut libc::c_void {
            None
        } else {
            NonNull::new(prev.cast())
        }
    }

    fn current_break(&self) -> NonNull<u8> {
        let cur = unsafe { libc::sbrk(0) };
        NonNull::new(cur.cast()).expect("sbrk(0) returned null")
    }
}

impl MapSource for System {
    fn map_anon(&self, bytes: usize) -> Option<NonNull<u8>> {
        let addr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                bytes,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            None
        } else {
            NonNull::new(addr.cast())
        }
    }

    unsafe fn unmap(&self, base: NonNull<u8>, bytes: usize) {
        unsafe {
            libc::munmap(base.as_ptr().cast(), bytes);
        }
    }

    fn page_size(&self) -> usize {
        unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_plausible() {
        let sys = System;
        let page = sys.page_size();
        assert!(page >= 4096);
        assert_eq!(page % 4096, 0);
    }

    #[test]
    fn map_then_unmap_roundtrips() {
        let sys = System;
        let page = sys.page_size();
        let base = sys.map_anon(page).expect("mmap failed");
        unsafe {
            base.as_ptr().write(0x42);
            assert_eq!(base.as_ptr().read(), 0x42);
            sys.unmap(base, page);
        }
    }
}
