use super::{FetchPredictor, gran_align};
use crate::common::WORD_SIZE;
use crate::core::memblock::MemBlock;

/// Fetches the `max_gran`-aligned chunks covering an access.
#[derive(Clone, Copy, Debug)]
pub struct AlignedPredictor {
    max_gran: u64,
}

impl AlignedPredictor {
    pub fn new(max_gran: u64) -> Self {
        Self { max_gran }
    }

    /// Aligned chunks covering `[ea, ea + size)`, in ascending address order.
    pub fn chunks(&self, ea: u64, size: u64, ins_count: u64) -> Vec<MemBlock> {
        let first = gran_align(ea, self.max_gran);
        let last = gran_align(ea + size.max(1) - 1, self.max_gran);
        (first..=last)
            .step_by(self.max_gran as usize)
            .map(|start| MemBlock::new(start, start + self.max_gran - WORD_SIZE, ins_count, 1))
            .collect()
    }
}

impl FetchPredictor for AlignedPredictor {
    fn predict(&self, ea: u64, size: u64, ins_count: u64) -> Vec<MemBlock> {
        self.chunks(ea, size, ins_count)
    }

    fn name(&self) -> &'static str {
        "aligned"
    }
}
