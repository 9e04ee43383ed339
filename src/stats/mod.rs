//! Batch-level statistics: multiple-comparison correction.

pub mod adjust;

pub use adjust::*;
