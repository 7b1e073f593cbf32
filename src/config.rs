//! Compile-time and per-instance tuning knobs.
//!
//! `NUM_LISTS` fixes the shape of the segregated free-list array at compile
//! time, the same way a buddy allocator fixes its level count. Everything
//! else a test might plausibly want to shrink — the initial heap
//! reservation, the mmap threshold, the minimum block size — lives in
//! [`Config`] so a unit test can provoke heap extension or the mmap path
//! without waiting on production-sized numbers.

use crate::error::ConfigError;

/// Machine word size in bytes; also the alignment unit.
pub const W: usize = core::mem::size_of::<usize>();

/// Number of size classes in the segregated free-list index.
pub const NUM_LISTS: usize = 8;

/// Per-instance tuning knobs for a heap/mapper pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Bytes reserved for the heap the first time it is touched.
    pub heap_total_size: usize,
    /// Payload byte count above which a request is routed to the mapper.
    pub mmap_threshold: usize,
    /// Minimum block size, header + two link words + footer, word-aligned.
    pub b_min: usize,
    /// Minimum bytes requested per `brk_adjust` call, so a run of small
    /// allocations does not turn into a run of syscalls.
    pub heap_growth_min: usize,
}

impl Config {
    /// Production defaults: 4 KiB initial heap, 128 KiB mmap threshold, 32-byte
    /// minimum block, 4 KiB growth floor.
    pub const DEFAULT: Config = Config {
        heap_total_size: 4096,
        mmap_threshold: 128 * 1024,
        b_min: 32,
        heap_growth_min: 4096,
    };

    /// Validates the structural assumptions the engine relies on: `b_min` must
    /// be word-aligned, large enough to hold a header, two link words and a
    /// footer, and leave the low 3 header bits free for flags.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.b_min % W != 0 {
            return Err(ConfigError::MinBlockMisaligned);
        }
        if self.b_min < 4 * W {
            return Err(ConfigError::MinBlockTooSmall);
        }
        if self.b_min < 8 {
            return Err(ConfigError::ClassesTooNarrow);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
