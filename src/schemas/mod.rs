mod document;
pub mod messages;
mod retrievers;
pub mod structured_output;

pub use document::*;
pub use messages::*;
pub use retrievers::*;
pub use structured_output::{validate_against_schema, ResponseSchema, StructuredOutputSchema};
