use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::CompiledPage;
use super::PageCompiler;
use crate::ChangeToken;
use crate::FileProvider;
use crate::Result;

struct CachedTemplate {
    page: Arc<CompiledPage>,
    token: ChangeToken,
}

/// One keyed slot. Concurrent first requests for the same path share the
/// in-flight compilation through the cell; only the winner runs it.
struct CacheEntry {
    cell: OnceCell<CachedTemplate>,
}

impl CacheEntry {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            cell: OnceCell::new(),
        })
    }
}

/// Process-wide compiled template cache.
///
/// Reads are lock-free; each path compiles at most once concurrently.
/// Staleness is checked on access: a fired change token evicts the entry
/// and the caller recompiles in place. Failed compilations are not
/// cached.
pub struct TemplateCache {
    entries: DashMap<String, Arc<CacheEntry>>,
    compiler: Arc<dyn PageCompiler>,
    files: Arc<dyn FileProvider>,
    compile_count: AtomicU64,
}

impl TemplateCache {
    pub fn new(
        compiler: Arc<dyn PageCompiler>,
        files: Arc<dyn FileProvider>,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            compiler,
            files,
            compile_count: AtomicU64::new(0),
        }
    }

    /// Returns the cached artifact for `path`, compiling it on first use
    /// or after its source changed. Later callers of an in-flight
    /// compilation await the same result.
    pub async fn get_or_compile(
        &self,
        path: &str,
        token: CancellationToken,
    ) -> Result<Arc<CompiledPage>> {
        let key = normalize(path);
        loop {
            let entry = self
                .entries
                .entry(key.clone())
                .or_insert_with(CacheEntry::new)
                .clone();

            let result = entry
                .cell
                .get_or_try_init(|| async {
                    self.compile_count.fetch_add(1, Ordering::SeqCst);
                    let page = self
                        .compiler
                        .compile_page(self.files.clone(), path, token.clone())
                        .await?;
                    let change = self.files.watch(path);
                    Ok::<_, crate::Error>(CachedTemplate { page, token: change })
                })
                .await;

            match result {
                Ok(cached) => {
                    if cached.token.has_changed() {
                        debug!("cache entry for '{}' is stale, recompiling", key);
                        self.evict_entry(&key, &entry);
                        continue;
                    }
                    return Ok(cached.page.clone());
                }
                Err(e) => {
                    self.evict_entry(&key, &entry);
                    return Err(e);
                }
            }
        }
    }

    /// Drops the cached artifact for `path`; the next request recompiles.
    pub fn evict(
        &self,
        path: &str,
    ) {
        if self.entries.remove(&normalize(path)).is_some() {
            debug!("evicted '{}'", normalize(path));
        }
    }

    /// Removes `entry` only if the slot still holds it; a concurrent
    /// evict-and-recompile may already have replaced it.
    fn evict_entry(
        &self,
        key: &str,
        entry: &Arc<CacheEntry>,
    ) {
        self.entries
            .remove_if(key, |_, current| Arc::ptr_eq(current, entry));
    }

    /// Number of compilations started since construction.
    pub fn compile_count(&self) -> u64 {
        self.compile_count.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache keys are case-insensitive, slash-normalized, and rooted.
fn normalize(path: &str) -> String {
    let mut key = path.to_ascii_lowercase().replace('\\', "/");
    if !key.starts_with('/') {
        key.insert(0, '/');
    }
    key
}
