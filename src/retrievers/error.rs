use thiserror::Error;
use tokio::time::error::Elapsed;

use crate::vectorstore::VectorStoreError;

/// Errors specific to retrievers
#[derive(Error, Debug)]
pub enum RetrieverError {
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] VectorStoreError),

    #[error("Retrieval timed out: {0}")]
    TimeoutError(#[from] Elapsed),
}
