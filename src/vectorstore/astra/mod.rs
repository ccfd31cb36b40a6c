mod astra;
mod builder;

pub use astra::*;
pub use builder::*;
