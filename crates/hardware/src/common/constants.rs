//! Simulator-wide constants.
//!
//! Word size, default run lengths, per-outcome latencies and the fixed
//! capacities of the hint record format.

/// Word size in bytes. Every block boundary is aligned to this.
pub const WORD_SIZE: u64 = 8;

/// log2 of [`WORD_SIZE`].
pub const WORD_SHIFT: u32 = WORD_SIZE.trailing_zeros();

/// Default number of instructions treated as cache warm-up.
pub const WARM_INS: u64 = 10_000_000;

/// Default number of instructions to simulate (0 means the whole trace).
pub const SIM_COUNT: u64 = 200_000_000;

/// Latency of a collated hit.
pub const SET_COLLATED_HIT_ACCESS_LATENCY: u32 = 100;

/// Latency of a full hit.
pub const SET_HIT_ACCESS_LATENCY: u32 = 50;

/// Latency of a miss or partial miss.
pub const SET_MISS_ACCESS_LATENCY: u32 = 200;

/// Number of per-word counters an eviction record can hold.
pub const EVICT_BITMAP_MAX_SIZE: usize = 16;

/// Default region size used to bin hints.
pub const REGION_SIZE: u64 = 4096;

/// Minimum number of samples a region bin needs before its hints are used.
pub const REGION_THRESHOLD: u64 = 1;

/// Extra bytes per set a flexible run is given over the aligned run whose
/// hints it replays (four 64-byte lines worth of tag overhead).
pub const HINT_TAG_ALLOWANCE: u64 = 4 * 64;

/// Number of trace records between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Rounds `addr` down to its word boundary.
#[inline(always)]
pub fn word_align(addr: u64) -> u64 {
    (addr >> WORD_SHIFT) << WORD_SHIFT
}
