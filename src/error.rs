//! Failures of the upstream collaborators and of index persistence.
//!
//! Client mistakes (missing session header, unknown scenario) and absent
//! sessions are *not* errors: they are ordinary outcomes reported in the
//! response body. `ServiceError` covers only what a caller cannot fix by
//! changing its request.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// An embedding or completion call did not finish in time.
    #[error("{what} timed out after {secs}s")]
    Timeout { what: &'static str, secs: u64 },

    /// An embedding or completion call failed.
    #[error("{what} failed: {message}")]
    Upstream { what: &'static str, message: String },

    /// The built index could not be written to storage.
    #[error("failed to persist index: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn upstream(what: &'static str, err: anyhow::Error) -> Self {
        ServiceError::Upstream {
            what,
            message: format!("{:#}", err),
        }
    }
}

/// Run an upstream call under `limit`, mapping both elapsed time and call
/// failure into [`ServiceError`].
pub async fn with_timeout<T, F>(what: &'static str, limit: Duration, fut: F) -> Result<T, ServiceError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ServiceError::upstream(what, e)),
        Err(_) => Err(ServiceError::Timeout {
            what,
            secs: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_passes_through() {
        let v = with_timeout("embedding", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn test_failure_is_upstream() {
        let err = with_timeout::<(), _>("completion", Duration::from_secs(1), async {
            Err(anyhow::anyhow!("HTTP 500"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Upstream { what: "completion", .. }));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let err = with_timeout::<(), _>("completion", Duration::from_secs(2), async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "completion timed out after 2s");
    }
}
