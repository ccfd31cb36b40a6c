//! Timeout helpers for external calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;

/// Await `future` for at most `duration`.
///
/// An elapsed timer converts into the caller's error type, so every external
/// call site reports a timeout through its own error enum.
pub async fn with_timeout<T, E, F>(duration: Duration, future: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<Elapsed>,
{
    tokio::time::timeout(duration, future).await?
}
