//! Deployment settings: model credentials, document store location, and
//! pipeline tunables.
//!
//! Settings come from a TOML file with `[openai]`, `[astra]` and `[pipeline]`
//! sections; environment variables override whatever the file sets.
//!
//! ```toml
//! [openai]
//! model = "gpt-4o-mini"
//!
//! [astra]
//! api_endpoint = "https://db-id-region.apps.astra.datastax.com"
//! collection = "pca_documents"
//!
//! [pipeline]
//! max_rewrites = 2
//! relevance_threshold = 0.3
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::{
    llm::{OpenAI, DEFAULT_MODEL},
    rag::{AgenticRAG, AgenticRAGConfig, RAGError},
    vectorstore::{
        astra::{AstraStore, StoreBuilder, DEFAULT_KEYSPACE},
        VectorStoreError,
    },
};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ASTRA_DB_APPLICATION_TOKEN: &str = "ASTRA_DB_APPLICATION_TOKEN";
pub const ASTRA_DB_API_ENDPOINT: &str = "ASTRA_DB_API_ENDPOINT";
pub const ASTRA_DB_KEYSPACE: &str = "ASTRA_DB_KEYSPACE";
pub const ASTRA_COLLECTION_NAME: &str = "ASTRA_COLLECTION_NAME";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting: {0}")]
    Invalid(String),

    #[error("Document store configuration error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

impl From<ConfigError> for RAGError {
    fn from(err: ConfigError) -> Self {
        RAGError::InvalidConfiguration(err.to_string())
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(SecretString::from))
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_keyspace() -> String {
    DEFAULT_KEYSPACE.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    pub model: String,
    /// Alternative API base, e.g. a proxy or a compatible server
    pub base_url: Option<String>,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AstraSettings {
    #[serde(deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
    pub api_endpoint: Option<String>,
    pub keyspace: String,
    pub collection: Option<String>,
}

impl Default for AstraSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_endpoint: None,
            keyspace: default_keyspace(),
            collection: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai: OpenAISettings,
    pub astra: AstraSettings,
    pub pipeline: AgenticRAGConfig,
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Read `path` if given, apply the process environment, and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let settings = settings.with_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Override file values with the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Override file values with whatever `lookup` returns. Blank values are
    /// ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(OPENAI_API_KEY) {
            self.openai.api_key = Some(SecretString::from(key));
        }
        if let Some(model) = get(OPENAI_MODEL) {
            self.openai.model = model;
        }
        if let Some(base_url) = get(OPENAI_BASE_URL) {
            self.openai.base_url = Some(base_url);
        }
        if let Some(token) = get(ASTRA_DB_APPLICATION_TOKEN) {
            self.astra.token = Some(SecretString::from(token));
        }
        if let Some(endpoint) = get(ASTRA_DB_API_ENDPOINT) {
            self.astra.api_endpoint = Some(endpoint);
        }
        if let Some(keyspace) = get(ASTRA_DB_KEYSPACE) {
            self.astra.keyspace = keyspace;
        }
        if let Some(collection) = get(ASTRA_COLLECTION_NAME) {
            self.astra.collection = Some(collection);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.api_key.is_none() {
            return Err(ConfigError::Missing(OPENAI_API_KEY));
        }
        if self.openai.model.trim().is_empty() {
            return Err(ConfigError::Invalid("openai.model is empty".to_string()));
        }
        if self.astra.token.is_none() {
            return Err(ConfigError::Missing(ASTRA_DB_APPLICATION_TOKEN));
        }
        if self.astra.api_endpoint.is_none() {
            return Err(ConfigError::Missing(ASTRA_DB_API_ENDPOINT));
        }
        if self.astra.collection.is_none() {
            return Err(ConfigError::Missing(ASTRA_COLLECTION_NAME));
        }
        self.pipeline
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn openai_client(&self) -> Result<OpenAI, ConfigError> {
        let key = self
            .openai
            .api_key
            .as_ref()
            .ok_or(ConfigError::Missing(OPENAI_API_KEY))?;

        let mut config = OpenAIConfig::new().with_api_key(key.expose_secret());
        if let Some(base_url) = &self.openai.base_url {
            config = config.with_api_base(base_url.as_str());
        }
        Ok(OpenAI::new(config).with_model(self.openai.model.as_str()))
    }

    pub fn astra_store(&self) -> Result<AstraStore, ConfigError> {
        let token = self
            .astra
            .token
            .as_ref()
            .ok_or(ConfigError::Missing(ASTRA_DB_APPLICATION_TOKEN))?;
        let endpoint = self
            .astra
            .api_endpoint
            .as_deref()
            .ok_or(ConfigError::Missing(ASTRA_DB_API_ENDPOINT))?;
        let collection = self
            .astra
            .collection
            .as_deref()
            .ok_or(ConfigError::Missing(ASTRA_COLLECTION_NAME))?;

        let store = StoreBuilder::new()
            .api_endpoint(endpoint)
            .token(SecretString::from(token.expose_secret()))
            .keyspace(self.astra.keyspace.as_str())
            .collection(collection)
            .timeout(self.pipeline.call_timeout())
            .build()?;
        Ok(store)
    }

    /// Wire the OpenAI client and Astra store into a ready pipeline.
    pub fn build_pipeline(&self) -> Result<AgenticRAG, RAGError> {
        let llm = self.openai_client()?;
        let store = self.astra_store()?;
        AgenticRAG::builder()
            .with_llm(Arc::new(llm))
            .with_document_store(Arc::new(store))
            .with_config(self.pipeline.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const FULL: &str = r#"
        [openai]
        api_key = "sk-test"
        model = "gpt-4o"

        [astra]
        token = "AstraCS:test"
        api_endpoint = "https://db.example.com"
        collection = "pca_documents"

        [pipeline]
        max_rewrites = 1
    "#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_toml_str_reads_sections() {
        let settings = Settings::from_toml_str(FULL).unwrap();
        assert_eq!(settings.openai.model, "gpt-4o");
        assert_eq!(
            settings.openai.api_key.as_ref().map(|k| k.expose_secret()),
            Some("sk-test")
        );
        assert_eq!(settings.astra.keyspace, DEFAULT_KEYSPACE);
        assert_eq!(settings.pipeline.max_rewrites, 1);
        assert_eq!(settings.pipeline.max_docs, 8);
        settings.validate().unwrap();
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.openai.model, DEFAULT_MODEL);
        assert!(settings.openai.api_key.is_none());
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Missing(OPENAI_API_KEY))
        ));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let settings = Settings::from_toml_str(FULL).unwrap().with_overrides(env(&[
            (OPENAI_MODEL, "gpt-4.1"),
            (ASTRA_DB_KEYSPACE, "pca"),
            (ASTRA_COLLECTION_NAME, "  "),
        ]));
        assert_eq!(settings.openai.model, "gpt-4.1");
        assert_eq!(settings.astra.keyspace, "pca");
        assert_eq!(settings.astra.collection.as_deref(), Some("pca_documents"));
    }

    #[test]
    fn test_overrides_alone_are_sufficient() {
        let settings = Settings::default().with_overrides(env(&[
            (OPENAI_API_KEY, "sk-env"),
            (ASTRA_DB_APPLICATION_TOKEN, "AstraCS:env"),
            (ASTRA_DB_API_ENDPOINT, "https://db.example.com"),
            (ASTRA_COLLECTION_NAME, "docs"),
        ]));
        settings.validate().unwrap();
        let store = settings.astra_store().unwrap();
        assert_eq!(
            store.collection_url(),
            "https://db.example.com/api/json/v1/default_keyspace/docs"
        );
    }

    #[test]
    fn test_secrets_are_not_printed() {
        let settings = Settings::from_toml_str(FULL).unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("sk-test"));
        assert!(!printed.contains("AstraCS:test"));
    }

    #[test]
    fn test_invalid_pipeline_is_rejected() {
        let raw = FULL.replace("max_rewrites = 1", "max_docs = 0");
        let settings = Settings::from_toml_str(&raw).unwrap();
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            Settings::from_toml_str("[openai\nmodel = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_build_pipeline_from_settings() {
        let settings = Settings::from_toml_str(FULL).unwrap();
        let pipeline = settings.build_pipeline().unwrap();
        assert_eq!(pipeline.config().max_rewrites, 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::from_file("/nonexistent/clerk.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        let rag: RAGError = err.into();
        assert!(matches!(rag, RAGError::InvalidConfiguration(_)));
    }
}
