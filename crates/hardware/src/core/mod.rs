//! Cache model: blocks, sets, the controller and the fetch predictors.

/// Variable-size cache blocks.
pub mod block;

/// Ideal fully associative sets.
pub mod cache;

/// Set routing, eviction and warm-up.
pub mod controller;

/// Predicted fetch ranges.
pub mod memblock;

/// Fetch-range predictors.
pub mod predict;

/// Eviction records and their binary layout.
pub mod record;

pub use self::cache::{AccessKind, IdealCache};
pub use self::controller::CacheController;
pub use self::memblock::MemBlock;
pub use self::record::EvictionRecord;
