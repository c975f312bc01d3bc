use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::WorkQueue;
use crate::QueueConfig;
use crate::Result;

/// Background consumer loop for a [`WorkQueue`].
///
/// Each item runs to completion exactly once; a failing item is logged
/// and the loop continues with the next one. The loop stops when the
/// queue is closed and empty, or when `token` is cancelled.
pub struct QueueWorker;

impl QueueWorker {
    pub fn spawn(
        queue: Arc<WorkQueue>,
        config: QueueConfig,
        token: CancellationToken,
    ) -> Result<tokio::task::JoinHandle<()>> {
        let mut stream = queue.drain(token.clone())?;
        let grace = Duration::from_millis(config.consumer_shutdown_grace_ms);
        // Tolerate a config that skipped validate().
        let log_every = config.drain_log_every.max(1);

        Ok(tokio::spawn(async move {
            let mut drained: u64 = 0;

            while let Some(item) = stream.next().await {
                let fut = item(token.child_token());
                tokio::pin!(fut);

                let result = tokio::select! {
                    result = &mut fut => result,
                    _ = token.cancelled() => {
                        // Shutdown requested mid-item; the item still runs
                        // to completion, the grace period only bounds how
                        // quietly it may do so.
                        match timeout(grace, &mut fut).await {
                            Ok(result) => result,
                            Err(_) => {
                                info!("in-flight work item exceeded the shutdown grace period; waiting for it");
                                fut.await
                            }
                        }
                    }
                };

                if let Err(e) = result {
                    error!("work item failed: {:?}", e);
                }

                drained += 1;
                if drained % log_every == 0 {
                    debug!("queue consumer drained {} items", drained);
                }
            }

            info!("queue consumer loop stopped after {} items", drained);
        }))
    }
}
