mod error;
pub use error::*;

mod document_store;
pub use document_store::*;

pub mod astra;
