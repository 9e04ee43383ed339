//! Dataset retrieval (remote or local).

pub mod owid;

pub use owid::*;
