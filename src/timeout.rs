use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ServiceError;
use crate::models::ServiceResult;

/// Deadline applied to every downstream call.
pub const DOWNSTREAM_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Outcome of a bounded call plus the wall-clock time it took.
#[derive(Debug)]
pub struct Timed<T> {
    pub outcome: Result<T, ServiceError>,
    pub latency_ms: u64,
}

impl Timed<String> {
    /// Convert a call that yields an id into a `ServiceResult`.
    pub fn into_service_result(self) -> ServiceResult {
        match self.outcome {
            Ok(id) => ServiceResult::succeeded(id, self.latency_ms),
            Err(e) => ServiceResult::failed(e, self.latency_ms),
        }
    }
}

/// Race `operation` against a deadline.
///
/// Elapsed time is always reported. When the deadline wins, the operation's
/// future is dropped, which cancels any in-flight request it owns.
pub async fn with_timeout<T, F>(operation: F, timeout: Duration, label: &str) -> Timed<T>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    let start = Instant::now();

    let outcome = match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                "⏱️  {} did not settle within {}ms",
                label,
                timeout.as_millis()
            );
            Err(ServiceError::Timeout {
                label: label.to_string(),
                timeout_ms: Some(timeout.as_millis() as u64),
            })
        }
    };

    Timed {
        outcome,
        latency_ms: start.elapsed().as_millis() as u64,
    }
}
