use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::DynamicPageCompiler;
use crate::FileProvider;
use crate::Page;
use crate::PageResponse;
use crate::PostbackData;
use crate::QueueWorker;
use crate::Result;
use crate::Settings;
use crate::TemplateCache;
use crate::WorkQueue;

/// Process-wide engine front end.
///
/// Owns the template cache and the deferred-work queue; each request gets
/// a fresh control tree instantiated from the shared compiled artifact.
pub struct PageHost {
    settings: Settings,
    cache: Arc<TemplateCache>,
    queue: Arc<WorkQueue>,
}

impl PageHost {
    pub fn new(
        settings: Settings,
        files: Arc<dyn FileProvider>,
    ) -> Self {
        let compiler = Arc::new(DynamicPageCompiler::new(settings.compiler.clone()));
        let cache = Arc::new(TemplateCache::new(compiler, files));
        Self {
            settings,
            cache,
            queue: Arc::new(WorkQueue::new()),
        }
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    pub fn queue(&self) -> &Arc<WorkQueue> {
        &self.queue
    }

    /// Runs one full request: compile (or hit the cache), instantiate,
    /// wire up the application's handlers, replay the lifecycle.
    ///
    /// `configure` runs before Init, so handler registration and dynamic
    /// tree adjustments land ahead of state tracking.
    pub async fn handle_request<F>(
        &self,
        path: &str,
        postback: Option<PostbackData>,
        prior_state: Option<Vec<u8>>,
        configure: F,
        token: CancellationToken,
    ) -> Result<PageResponse>
    where
        F: FnOnce(&mut Page) -> Result<()>,
    {
        let compiled = self.cache.get_or_compile(path, token).await?;
        let mut page = compiled.instantiate(&self.settings.validation)?;
        configure(&mut page)?;
        page.process_request(postback.as_ref(), prior_state.as_deref())
    }

    /// Defers compilation of `path` to the queue consumer so a later
    /// request finds the artifact already cached. A failed precompile is
    /// logged by the consumer; the next request retries inline.
    pub fn precompile(
        &self,
        path: &str,
    ) {
        let cache = self.cache.clone();
        let path = path.to_string();
        debug!("queueing precompilation of '{}'", path);
        self.queue.enqueue(Box::new(move |token| {
            async move {
                cache.get_or_compile(&path, token).await?;
                Ok(())
            }
            .boxed()
        }));
    }

    /// Starts the background consumer for deferred work.
    pub fn spawn_worker(
        &self,
        token: CancellationToken,
    ) -> Result<tokio::task::JoinHandle<()>> {
        QueueWorker::spawn(self.queue.clone(), self.settings.queue.clone(), token)
    }

    /// Stops accepting deferred work; the consumer exits once the queue
    /// is empty.
    pub fn shutdown(&self) {
        self.queue.close();
    }
}
