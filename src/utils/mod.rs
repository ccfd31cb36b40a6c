//! Small helpers shared across the pipeline.

pub mod async_utils;
pub mod similarity;

pub use async_utils::*;
pub use similarity::*;
