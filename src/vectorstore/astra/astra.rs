use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::{
    schemas::Passage,
    vectorstore::{apply_score_threshold, DocumentStore, VectorStoreError},
};

/// Astra DB collection queried through the JSON Data API.
pub struct Store {
    pub(super) client: Client,
    pub(super) collection_url: String,
    pub(super) token: SecretString,
}

pub type AstraStore = Store;

impl Store {
    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    fn find_command(query: &str, k: usize) -> Value {
        json!({
            "find": {
                "sort": { "$vectorize": query },
                "projection": { "$vectorize": 1, "content": 1, "metadata": 1 },
                "options": { "limit": k, "includeSimilarity": true }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    data: Option<FindData>,
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct FindData {
    documents: Vec<AstraDocument>,
}

#[derive(Debug, Deserialize)]
struct AstraDocument {
    #[serde(rename = "_id")]
    id: Value,
    #[serde(rename = "$vectorize")]
    vectorize: Option<String>,
    content: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(rename = "$similarity")]
    similarity: Option<f64>,
}

impl AstraDocument {
    fn into_passage(self) -> Passage {
        let source_id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        let text = self.vectorize.or(self.content).unwrap_or_default();

        let mut passage =
            Passage::new(text, source_id).with_score(self.similarity.unwrap_or(0.0));
        if let Some(title) = metadata_str(&self.metadata, "title") {
            passage = passage.with_title(title);
        }
        // Ingestion stored the document link under `author`.
        if let Some(url) = ["url", "author", "source"]
            .iter()
            .find_map(|key| metadata_str(&self.metadata, key))
        {
            passage = passage.with_url(url);
        }
        if let Some(page) = metadata_page(&self.metadata) {
            passage = passage.with_page(page);
        }
        passage
    }
}

fn metadata_str(metadata: &Map<String, Value>, key: &str) -> Option<String> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn metadata_page(metadata: &Map<String, Value>) -> Option<u32> {
    match metadata.get("page")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|p| u32::try_from(p).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for Store {
    async fn search(
        &self,
        query: &str,
        score_threshold: f64,
        k: usize,
    ) -> Result<Vec<Passage>, VectorStoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.collection_url)
            .header("Token", self.token.expose_secret())
            .json(&Self::find_command(query, k))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VectorStoreError::StatusError {
                status: status.as_u16(),
                body,
            });
        }

        let body: FindResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::DeserializationError(e.to_string()))?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            return Err(VectorStoreError::ApiError(Value::Array(errors).to_string()));
        }

        let documents = body
            .data
            .ok_or_else(|| {
                VectorStoreError::DeserializationError(
                    "expected data.documents in Astra response".to_string(),
                )
            })?
            .documents;

        log::debug!("astra find returned {} documents", documents.len());

        let passages = documents
            .into_iter()
            .map(AstraDocument::into_passage)
            .collect();
        Ok(apply_score_threshold(passages, score_threshold, k))
    }
}
