use async_trait::async_trait;

use super::Passage;
use crate::retrievers::RetrieverError;

#[async_trait]
pub trait Retriever: Sync + Send {
    async fn get_relevant_passages(&self, query: &str) -> Result<Vec<Passage>, RetrieverError>;
}
