//! Retrievers over the document store.
//!
//! All retrievers implement the `Retriever` trait from `crate::schemas::Retriever`.

mod error;
pub use error::*;

mod vector_store_retriever;
pub use vector_store_retriever::*;
