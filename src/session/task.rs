//! A dispatched generation call that can be awaited, aborted or timed out.

use crate::error::{NanoCanvasError, Result};
use crate::image::{GenerationRequest, GenerationResult, ImageGenerator};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Handle to one in-flight generation.
#[must_use = "a dispatched task should be joined so its result reaches the session"]
pub struct GenerationTask {
    handle: JoinHandle<Result<GenerationResult>>,
}

impl GenerationTask {
    /// Spawns the generation on the current tokio runtime.
    ///
    /// With `timeout` set, a call that has not finished in time completes as
    /// a transport failure.
    pub fn spawn(
        generator: Arc<dyn ImageGenerator>,
        request: GenerationRequest,
        timeout: Option<Duration>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, generator.generate(request))
                    .await
                    .map_err(|_| {
                        NanoCanvasError::Transport(format!(
                            "generation timed out after {:?}",
                            limit
                        ))
                    }),
                None => Ok(generator.generate(request).await),
            }
        });
        Self { handle }
    }

    /// Requests cancellation. The task still has to be joined.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Waits for the outcome. Aborts, panics and timeouts become transport failures.
    pub async fn join(self) -> GenerationResult {
        let outcome = match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => {
                Err(NanoCanvasError::Transport("generation was cancelled".into()))
            }
            Err(e) => Err(NanoCanvasError::Transport(format!(
                "generation task failed: {}",
                e
            ))),
        };
        outcome.unwrap_or_else(|e| {
            tracing::warn!("generation did not complete: {e}");
            GenerationResult::from_error(&e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;

    struct FixedGenerator;

    #[async_trait]
    impl ImageGenerator for FixedGenerator {
        async fn generate(&self, _request: GenerationRequest) -> GenerationResult {
            GenerationResult::Success {
                image_locator: "data:image/png;base64,AAAA".into(),
            }
        }
    }

    struct StalledGenerator;

    #[async_trait]
    impl ImageGenerator for StalledGenerator {
        async fn generate(&self, _request: GenerationRequest) -> GenerationResult {
            std::future::pending::<GenerationResult>().await
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("a red circle").unwrap()
    }

    #[tokio::test]
    async fn test_join_returns_result() {
        let task = GenerationTask::spawn(Arc::new(FixedGenerator), request(), None);
        let result = task.join().await;
        assert_eq!(result.image_locator(), Some("data:image/png;base64,AAAA"));
    }

    #[tokio::test]
    async fn test_abort_yields_transport_failure() {
        let task = GenerationTask::spawn(Arc::new(StalledGenerator), request(), None);
        task.abort();

        match task.join().await {
            GenerationResult::Failure { reason, detail } => {
                assert_eq!(reason, ErrorKind::Transport);
                assert!(detail.contains("cancelled"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_transport_failure() {
        let task = GenerationTask::spawn(
            Arc::new(StalledGenerator),
            request(),
            Some(Duration::from_secs(30)),
        );

        match task.join().await {
            GenerationResult::Failure { reason, detail } => {
                assert_eq!(reason, ErrorKind::Transport);
                assert!(detail.contains("timed out after 30s"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_timeout_is_reported_in_millis() {
        let task = GenerationTask::spawn(
            Arc::new(StalledGenerator),
            request(),
            Some(Duration::from_millis(250)),
        );

        match task.join().await {
            GenerationResult::Failure { reason, detail } => {
                assert_eq!(reason, ErrorKind::Transport);
                assert!(detail.contains("timed out after 250ms"), "{detail}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
