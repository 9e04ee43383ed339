//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration (`PipelineConfig`, `TableSource`)
//! - tidy observations and group keys (`Observation`, `GroupKey`)
//! - fit outputs (`TrendFit`, `SlopeRecord`, `SkippedGroup`)

pub mod types;

pub use types::*;
