//! Detached-task helpers.
//!
//! The bot fires most outbound work without awaiting it: notification sends
//! and retractions must not block event handling, and periodic tasks must
//! outlive individual failures.

use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Spawn a fire-and-forget task. The caller never awaits completion; the
/// task's own failure handling is log-and-drop. Stale-reference failures are
/// an expected race and only logged at debug level.
pub fn spawn_logged<F>(what: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match fut.await {
            Ok(()) => {}
            Err(e) if e.is_stale_reference() => {
                tracing::debug!("{what}: target already gone: {e}");
            }
            Err(e) => {
                tracing::warn!("{what} failed: {e}");
            }
        }
    })
}

/// Run `tick` every `period` until cancelled. Errors are caught at the top of
/// each run and logged with full detail; the task continues its next
/// scheduled run rather than terminating.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = tick().await {
                        tracing::error!("{name}: {e}");
                    }
                }
            }
        }
        tracing::debug!("{name}: stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::*;
    use crate::Error;

    #[tokio::test(start_paused = true)]
    async fn periodic_task_survives_errors() {
        let runs = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();

        let counter = runs.clone();
        let handle = spawn_periodic(
            "test-task",
            Duration::from_secs(60),
            cancel.clone(),
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Error::Gateway("boom".to_string()))
                }
            },
        );

        tokio::time::sleep(Duration::from_secs(150)).await;
        cancel.cancel();
        handle.await.unwrap();

        // First tick fires immediately, then at 60s and 120s.
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn spawn_logged_swallows_failures() {
        let handle = spawn_logged("doomed send", async {
            Err(Error::NotFound("message 1".to_string()))
        });
        handle.await.unwrap();
    }
}
