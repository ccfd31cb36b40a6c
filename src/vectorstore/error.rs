use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Document store returned status {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("Document store reported errors: {0}")]
    ApiError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serde json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}
