//! Per-group trend fitting.
//!
//! Responsibilities:
//!
//! - partition the tidy table into (entity, crop) groups (stable order)
//! - fit each group's regression independently (parallel)
//! - extract the year-term slope record from each fit

pub mod grouped;
pub mod linreg;

pub use grouped::*;
pub use linreg::*;
