//! Fetch-range predictors.
//!
//! A predictor turns one memory access into the ranges the cache should
//! fetch for it. Three strategies are available:
//! 1. **Aligned:** the `max_gran`-aligned chunks covering the access, as a
//!    conventional fixed-line cache would fetch.
//! 2. **Exact:** exactly the words of the access.
//! 3. **Region:** a per-region histogram of run lengths, learned from the
//!    hints of an earlier aligned run, sizes the fetch.

use super::memblock::MemBlock;

pub use self::aligned::AlignedPredictor;
pub use self::exact::ExactPredictor;
pub use self::region::{RegionHistogram, RegionPredictor, RunLengthSummary};

pub mod aligned;
pub mod exact;
pub mod region;

/// Strategy that maps an access to the ranges to fetch.
pub trait FetchPredictor: Send + Sync {
    /// Returns the ranges to fetch for an access of `size` bytes at the
    /// word-aligned address `ea`.
    fn predict(&self, ea: u64, size: u64, ins_count: u64) -> Vec<MemBlock>;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;
}

/// Start of the `max_gran` chunk holding `addr`.
#[inline]
pub fn gran_align(addr: u64, max_gran: u64) -> u64 {
    addr & !(max_gran - 1)
}

/// Returns `true` if the `size` bytes at `ea` cross a `max_gran` boundary.
pub fn is_spanning_access(ea: u64, size: u64, max_gran: u64) -> bool {
    let last = ea + size.max(1) - 1;
    gran_align(ea, max_gran) != gran_align(last, max_gran)
}
