use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;
use url::Url;

use crate::vectorstore::VectorStoreError;

use super::Store;

pub const DEFAULT_KEYSPACE: &str = "default_keyspace";

/// Builder for the Astra DB document store.
///
/// The collection must have a vectorize integration configured so the
/// store embeds queries server-side. Passage text is read from `$vectorize`
/// (or `content`), source metadata from the `metadata` sub-document.
pub struct StoreBuilder {
    client: Option<Client>,
    api_endpoint: Option<String>,
    token: Option<SecretString>,
    keyspace: String,
    collection: Option<String>,
    timeout: Option<Duration>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        StoreBuilder {
            client: None,
            api_endpoint: None,
            token: None,
            keyspace: DEFAULT_KEYSPACE.to_string(),
            collection: None,
            timeout: None,
        }
    }

    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn api_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }

    pub fn token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn keyspace<S: Into<String>>(mut self, keyspace: S) -> Self {
        self.keyspace = keyspace.into();
        self
    }

    pub fn collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// HTTP timeout, ignored when a client is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Store, VectorStoreError> {
        let endpoint = self
            .api_endpoint
            .ok_or_else(|| VectorStoreError::InvalidParameter("api_endpoint is required".into()))?;
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            VectorStoreError::InvalidParameter(format!("invalid api_endpoint {}: {}", endpoint, e))
        })?;
        let token = self
            .token
            .ok_or_else(|| VectorStoreError::InvalidParameter("token is required".into()))?;
        let collection = self
            .collection
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| VectorStoreError::InvalidParameter("collection is required".into()))?;
        if self.keyspace.trim().is_empty() {
            return Err(VectorStoreError::InvalidParameter(
                "keyspace must not be empty".into(),
            ));
        }

        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        let collection_url = format!(
            "{}/api/json/v1/{}/{}",
            endpoint.as_str().trim_end_matches('/'),
            self.keyspace,
            collection
        );

        Ok(Store {
            client,
            collection_url,
            token,
        })
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
