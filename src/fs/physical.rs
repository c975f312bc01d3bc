use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::ChangeNotifier;
use super::ChangeToken;
use super::FileInfo;
use super::FileProvider;
use crate::CompilerConfig;
use crate::Result;

/// Disk-backed [`FileProvider`] rooted at a directory.
///
/// Change detection polls the (last-modified, length) fingerprint on the
/// configured interval and fires the token once it diverges. Polling
/// loops stop when the provider's shutdown token is cancelled.
pub struct PhysicalFileProvider {
    root: PathBuf,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl PhysicalFileProvider {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &CompilerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            root: root.into(),
            poll_interval: Duration::from_millis(config.watch_poll_interval_ms),
            shutdown,
        }
    }

    fn resolve(
        &self,
        path: &str,
    ) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    async fn fingerprint(path: &Path) -> Option<(Option<SystemTime>, u64)> {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Some((meta.modified().ok(), meta.len())),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl FileProvider for PhysicalFileProvider {
    async fn get_file_info(
        &self,
        path: &str,
    ) -> Result<FileInfo> {
        let full = self.resolve(path);
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(FileInfo {
                exists: true,
                last_modified: meta.modified().ok(),
                length: meta.len(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileInfo::missing()),
            Err(e) => Err(e.into()),
        }
    }

    async fn open_read(
        &self,
        path: &str,
    ) -> Result<Vec<u8>> {
        let full = self.resolve(path);
        Ok(tokio::fs::read(&full).await?)
    }

    fn watch(
        &self,
        path: &str,
    ) -> ChangeToken {
        let notifier = ChangeNotifier::new();
        let token = notifier.token();

        let full = self.resolve(path);
        let poll_interval = self.poll_interval;
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let initial = PhysicalFileProvider::fingerprint(&full).await;
            let mut ticker = interval(poll_interval);
            ticker.tick().await; // first tick completes immediately

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("stopping watch for {:?}: shutdown requested", full);
                        return;
                    }
                    _ = ticker.tick() => {}
                }

                let current = PhysicalFileProvider::fingerprint(&full).await;
                if current != initial {
                    warn!("template source changed: {:?}", full);
                    notifier.notify();
                    return;
                }
            }
        });

        token
    }
}
