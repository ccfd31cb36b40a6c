pub mod fake;
pub use fake::*;

pub mod openai;
pub use openai::*;
