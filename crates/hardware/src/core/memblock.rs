use crate::common::WORD_SIZE;

/// A candidate fetch range produced by a predictor.
///
/// Exists only for the duration of one controller access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemBlock {
    /// Word-aligned start address.
    pub start: u64,
    /// Word-aligned end address (inclusive).
    pub end: u64,
    /// Instruction count of the access that produced the range.
    pub ins_count: u64,
    /// Multiplicity of the request.
    pub mod_count: u32,
}

impl MemBlock {
    pub fn new(start: u64, end: u64, ins_count: u64, mod_count: u32) -> Self {
        debug_assert!(start <= end, "memblock {:#x}..={:#x} is inverted", start, end);
        Self {
            start,
            end,
            ins_count,
            mod_count,
        }
    }

    /// Size of the range in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.end - self.start + WORD_SIZE
    }

    /// Size of the range in words.
    #[inline]
    pub fn words(&self) -> u64 {
        self.size() / WORD_SIZE
    }

    /// Word addresses covered by the range.
    pub fn word_addresses(&self) -> impl Iterator<Item = u64> {
        (self.start..=self.end).step_by(WORD_SIZE as usize)
    }
}
