use std::time::SystemTime;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::ChangeToken;
use crate::Result;

/// Metadata snapshot for a template source path.
#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub exists: bool,
    /// Last-modified fingerprint; `None` when the backing store does not
    /// track modification times or the file is absent.
    pub last_modified: Option<SystemTime>,
    pub length: u64,
}

impl FileInfo {
    pub fn missing() -> Self {
        Self {
            exists: false,
            last_modified: None,
            length: 0,
        }
    }
}

/// Abstraction over template source retrieval.
///
/// The dynamic compiler depends only on this contract, so hosts can serve
/// templates from disk, memory, or any other store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileProvider: Send + Sync + 'static {
    /// Metadata for `path`. Absence is reported through
    /// [`FileInfo::exists`], not as an error.
    async fn get_file_info(&self, path: &str) -> Result<FileInfo>;

    /// Full content of `path`. Fails if the path is absent.
    async fn open_read(&self, path: &str) -> Result<Vec<u8>>;

    /// Registers a change watch for `path`. The returned token fires when
    /// the content changes after registration.
    fn watch(&self, path: &str) -> ChangeToken;
}
