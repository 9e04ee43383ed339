//! Chart rendering (SVG).

pub mod charts;

pub use charts::*;
