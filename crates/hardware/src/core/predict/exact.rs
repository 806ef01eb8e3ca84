use super::FetchPredictor;
use crate::common::WORD_SIZE;
use crate::core::memblock::MemBlock;

/// Fetches exactly the words of the access. Used by flexible runs that have
/// no hints to learn from.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactPredictor;

impl FetchPredictor for ExactPredictor {
    fn predict(&self, ea: u64, size: u64, ins_count: u64) -> Vec<MemBlock> {
        let words = size.div_ceil(WORD_SIZE).max(1);
        vec![MemBlock::new(ea, ea + (words - 1) * WORD_SIZE, ins_count, 1)]
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}
