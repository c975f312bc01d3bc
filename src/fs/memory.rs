use std::collections::HashMap;
use std::io;
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::ChangeNotifier;
use super::ChangeToken;
use super::FileInfo;
use super::FileProvider;
use crate::Result;

struct MemoryFile {
    content: Vec<u8>,
    modified: SystemTime,
}

/// In-memory [`FileProvider`] for tests and embedded template sets.
///
/// Writing a path fires every outstanding change token registered for it.
#[derive(Default)]
pub struct MemoryFileProvider {
    files: Mutex<HashMap<String, MemoryFile>>,
    watchers: Mutex<HashMap<String, ChangeNotifier>>,
}

impl MemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `path`, firing its outstanding watch tokens.
    pub fn write(
        &self,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) {
        self.files.lock().insert(
            path.to_string(),
            MemoryFile {
                content: content.into(),
                modified: SystemTime::now(),
            },
        );

        if let Some(notifier) = self.watchers.lock().remove(path) {
            notifier.notify();
        }
    }

    /// Removes `path`, firing its outstanding watch tokens.
    pub fn remove(
        &self,
        path: &str,
    ) {
        self.files.lock().remove(path);
        if let Some(notifier) = self.watchers.lock().remove(path) {
            notifier.notify();
        }
    }
}

#[async_trait]
impl FileProvider for MemoryFileProvider {
    async fn get_file_info(
        &self,
        path: &str,
    ) -> Result<FileInfo> {
        Ok(match self.files.lock().get(path) {
            Some(file) => FileInfo {
                exists: true,
                last_modified: Some(file.modified),
                length: file.content.len() as u64,
            },
            None => FileInfo::missing(),
        })
    }

    async fn open_read(
        &self,
        path: &str,
    ) -> Result<Vec<u8>> {
        match self.files.lock().get(path) {
            Some(file) => Ok(file.content.clone()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, path.to_string()).into()),
        }
    }

    fn watch(
        &self,
        path: &str,
    ) -> ChangeToken {
        let mut watchers = self.watchers.lock();
        watchers
            .entry(path.to_string())
            .or_insert_with(ChangeNotifier::new)
            .token()
    }
}
