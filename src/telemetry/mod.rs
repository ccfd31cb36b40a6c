//! Best-effort record of which questions were asked.
//!
//! Tracking runs on its own task. Nothing here can delay or fail an answer;
//! errors end up in the log.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvent {
    pub id: Uuid,
    pub question: String,
    pub asked_at: DateTime<Utc>,
}

impl QueryEvent {
    pub fn new<S: Into<String>>(question: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            asked_at: Utc::now(),
        }
    }
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Tracker unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait QueryTracker: Send + Sync {
    async fn track(&self, event: &QueryEvent) -> Result<(), TelemetryError>;
}

/// Writes each event to the log as a JSON line.
#[derive(Debug, Clone, Default)]
pub struct LogQueryTracker;

#[async_trait]
impl QueryTracker for LogQueryTracker {
    async fn track(&self, event: &QueryEvent) -> Result<(), TelemetryError> {
        log::info!(target: "clerk_rag::telemetry", "{}", serde_json::to_string(event)?);
        Ok(())
    }
}

/// Send `event` to `tracker` on a spawned task and return immediately.
pub fn spawn_track(
    tracker: Arc<dyn QueryTracker>,
    event: QueryEvent,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tracker.track(&event).await {
            log::warn!(
                "telemetry_failure: could not record query {}: {}",
                event.id,
                e
            );
        }
    })
}
