//! Error types for the parts of the engine that can usefully report a reason.
//!
//! The public allocation surface (`allocate`/`free`) stays null/no-op on
//! failure, matching a `malloc`/`free` ABI. Everything one layer down —
//! [`Config`](crate::config::Config) validation and the syscall layer —
//! reports through [`BaseError`] instead of panicking.

use core::fmt::Debug;

/// Common trait implemented by every error type in this crate.
pub trait BaseError: Debug {}

/// Return type for functions that are allowed to fail and don't need to
/// return anything on success.
pub type CanFail<T> = Result<(), T>;

/// Raised when a [`Config`](crate::config::Config) violates one of the
/// engine's structural assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `b_min` is not a multiple of `word_size`.
    MinBlockMisaligned,
    /// `b_min` is too small to hold a header, two free-list link words, and a footer.
    MinBlockTooSmall,
    /// `b_min` leaves fewer than 3 bits of headroom below the word size, so the
    /// header's flag bits would collide with the size field.
    ClassesTooNarrow,
}

impl BaseError for ConfigError {}

/// Raised by the [`sys`](crate::sys) layer when a syscall-equivalent fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysError {
    /// `brk_adjust` could not extend the break.
    BrkFailed,
    /// `map_anon` could not obtain a mapping.
    MapFailed,
}

impl BaseError for SysError {}
