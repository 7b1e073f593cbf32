//! Block representation: the header/footer codec and address-order navigation.
//!
//! A block's header packs its size and two flag bits into one machine word,
//! the same trick `AllocHeader` (`inner: u64` with `allocate`/`free`/
//! `is_mapped` bit-twiddling) uses for its virtual-memory blocks —
//! specialised here to the two flags this engine needs.

use core::ptr::NonNull;

use crate::config::W;

const USED_BIT: usize = 0b001;
const MMAP_BIT: usize = 0b010;
const FLAG_MASK: usize = 0b111;
const SIZE_MASK: usize = !FLAG_MASK;

/// Rounds `n` up to the next multiple of the machine word size.
#[inline]
pub const fn align_up(n: usize) -> usize {
    (n + W - 1) & !(W - 1)
}

/// One header word: `size | used << 0 | mmap << 1`. Bit 2 is reserved.
///
/// Decoding is a single mask; size and flags never need to be pulled apart
/// by hand at the call sites.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Header(usize);

impl Header {
    /// Builds a header for a block of `size` bytes (already a multiple of `W`).
    #[inline]
    pub const fn new(size: usize, used: bool, mapped: bool) -> Self {
        let mut bits = size & SIZE_MASK;
        if used {
            bits |= USED_BIT;
        }
        if mapped {
            bits |= MMAP_BIT;
        }
        Header(bits)
    }

    #[inline]
    pub fn size(self) -> usize {
        self.0 & SIZE_MASK
    }

    #[inline]
    pub fn set_size(&mut self, size: usize) {
        self.0 = (self.0 & FLAG_MASK) | (size & SIZE_MASK);
    }

    #[inline]
    pub fn used(self) -> bool {
        self.0 & USED_BIT != 0
    }

    #[inline]
    pub fn set_used(&mut self, used: bool) {
        if used {
            self.0 |= USED_BIT;
        } else {
            self.0 &= !USED_BIT;
        }
    }

    #[inline]
    pub fn mapped(self) -> bool {
        self.0 & MMAP_BIT != 0
    }

    #[inline]
    pub fn set_mapped(&mut self, mapped: bool) {
        if mapped {
            self.0 |= MMAP_BIT;
        } else {
            self.0 &= !MMAP_BIT;
        }
    }
}

/// Forward and backward links stored in a free block's payload area.
///
/// Only meaningful while the block's used bit is clear; a used block's
/// payload bytes are the caller's data instead.
#[repr(C)]
pub struct FreeLinks {
    pub next: Option<NonNull<u8>>,
    pub prev: Option<NonNull<u8>>,
}

/// A non-null pointer to a block's header, with the raw-pointer navigation
/// the heap engine needs. Mirrors the `header_at`/`payload_ptr` free
/// functions a boundary-tag heap usually builds around, just packaged as
/// methods on a newtype instead of loose functions.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BlockRef(NonNull<u8>);

impl BlockRef {
    /// # Safety
    /// `addr` must point at the start of a valid block header.
    #[inline]
    pub unsafe fn from_addr(addr: NonNull<u8>) -> Self {
        BlockRef(addr)
    }

    #[inline]
    pub fn addr(self) -> NonNull<u8> {
        self.0
    }

    #[inline]
    pub fn as_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// # Safety
    /// The header word at this block's address must be initialized.
    #[inline]
    pub unsafe fn header(self) -> Header {
        unsafe { *self.0.as_ptr().cast::<Header>() }
    }

    /// # Safety
    /// The header word at this block's address must be writable.
    #[inline]
    pub unsafe fn set_header(self, header: Header) {
        unsafe { *self.0.as_ptr().cast::<Header>() = header };
    }

    /// # Safety
    /// `size` must be the block's true size, and the footer word at
    /// `self + size - W` must be writable.
    #[inline]
    pub unsafe fn write_footer(self, size: usize) {
        unsafe {
            let footer = self.0.as_ptr().add(size - W).cast::<usize>();
            footer.write(size);
        }
    }

    /// Returns the payload pointer: one word past the header.
    #[inline]
    pub fn payload(self) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.0.as_ptr().add(W)) }
    }

    /// Recovers the owning block from a payload pointer previously handed to a caller.
    ///
    /// # Safety
    /// `payload` must have been returned by [`BlockRef::payload`] on some live block.
    #[inline]
    pub unsafe fn from_payload(payload: NonNull<u8>) -> Self {
        unsafe { BlockRef(NonNull::new_unchecked(payload.as_ptr().sub(W))) }
    }

    /// The block immediately following this one in address order, given its size.
    #[inline]
    pub fn successor(self, size: usize) -> BlockRef {
        unsafe { BlockRef(NonNull::new_unchecked(self.0.as_ptr().add(size))) }
    }

    /// Reads the footer word immediately preceding this block, returning the
    /// size it records (the predecessor's size, if one exists).
    ///
    /// # Safety
    /// The word at `self - W` must be a valid footer, i.e. `self` must not be
    /// the first block of its contiguous span.
    #[inline]
    pub unsafe fn preceding_footer_size(self) -> usize {
        unsafe { *self.0.as_ptr().sub(W).cast::<usize>() }
    }

    /// The block immediately preceding this one, located via the footer at `self - W`.
    ///
    /// # Safety
    /// Same requirement as [`BlockRef::preceding_footer_size`].
    #[inline]
    pub unsafe fn predecessor(self) -> BlockRef {
        let prev_size = unsafe { self.preceding_footer_size() };
        unsafe { BlockRef(NonNull::new_unchecked(self.0.as_ptr().sub(prev_size))) }
    }

    /// Writes the forward/backward free-list links into this block's payload area.
    ///
    /// # Safety
    /// This block must currently be free (so its payload bytes are not live caller data).
    #[inline]
    pub unsafe fn set_links(self, links: FreeLinks) {
        unsafe { self.payload().as_ptr().cast::<FreeLinks>().write(links) };
    }

    /// Reads the forward/backward free-list links from this block's payload area.
    ///
    /// # Safety
    /// This block must currently be free.
    #[inline]
    pub unsafe fn links(self) -> FreeLinks {
        unsafe { self.payload().as_ptr().cast::<FreeLinks>().read() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_word() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), W);
        assert_eq!(align_up(W), W);
        assert_eq!(align_up(W + 1), 2 * W);
    }

    #[test]
    fn header_round_trips_size_and_flags() {
        let mut h = Header::new(256, false, false);
        assert_eq!(h.size(), 256);
        assert!(!h.used());
        assert!(!h.mapped());

        h.set_used(true);
        assert!(h.used());
        assert_eq!(h.size(), 256);

        h.set_mapped(true);
        assert!(h.mapped());
        assert!(h.used());
        assert_eq!(h.size(), 256);

        h.set_size(128);
        assert_eq!(h.size(), 128);
        assert!(h.used());
        assert!(h.mapped());
    }
}
