use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use futures::future::BoxFuture;
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::sync::WaitForCancellationFutureOwned;
use tracing::warn;

use crate::Error;
use crate::Result;

/// A deferred operation: receives a cancellation token scoped to its own
/// execution and runs to completion exactly once.
pub type WorkItem = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<()>> + Send>;

/// Unbounded multi-producer queue of deferred operations.
///
/// `enqueue` is non-blocking and, while the queue is open, never fails.
/// The queue has at most one consumer at a time: `drain` hands out the
/// receiver, a second call fails while that stream is alive, and
/// dropping the stream (including after cancellation) puts the receiver
/// back so the remaining items stay queued and drainable.
pub struct WorkQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<WorkItem>>>,
    rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<WorkItem>>>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Arc::new(Mutex::new(Some(rx))),
        }
    }

    /// Adds an item. Never blocks; items enqueued after `close` are
    /// dropped with a warning.
    pub fn enqueue(
        &self,
        item: WorkItem,
    ) {
        match &*self.tx.lock() {
            Some(tx) => {
                if tx.send(item).is_err() {
                    warn!("work item dropped: queue consumer is gone");
                }
            }
            None => warn!("work item dropped: queue is closed"),
        }
    }

    /// Closes the producer side. The drain stream ends once the already
    /// queued items are consumed.
    pub fn close(&self) {
        self.tx.lock().take();
    }

    /// Takes the consumer end as a cancellable stream of items. The
    /// stream is infinite until the queue is closed or `token` fires;
    /// a fired token stops the stream without discarding queued items.
    pub fn drain(
        &self,
        token: CancellationToken,
    ) -> Result<DrainStream> {
        let rx = self
            .rx
            .lock()
            .take()
            .ok_or_else(|| Error::Fatal("work queue is already being drained".to_string()))?;

        Ok(DrainStream {
            rx: Some(rx),
            slot: Arc::clone(&self.rx),
            cancelled: Box::pin(token.cancelled_owned()),
        })
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellable consumer stream returned by [`WorkQueue::drain`].
///
/// Dropping the stream returns the receiver to its queue; items left
/// undrained after a cancellation stay queued for the next consumer.
pub struct DrainStream {
    rx: Option<mpsc::UnboundedReceiver<WorkItem>>,
    slot: Arc<Mutex<Option<mpsc::UnboundedReceiver<WorkItem>>>>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl Stream for DrainStream {
    type Item = WorkItem;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(None);
        }
        match this.rx.as_mut() {
            Some(rx) => rx.poll_recv(cx),
            None => Poll::Ready(None),
        }
    }
}

impl Drop for DrainStream {
    fn drop(&mut self) {
        if let Some(rx) = self.rx.take() {
            *self.slot.lock() = Some(rx);
        }
    }
}
