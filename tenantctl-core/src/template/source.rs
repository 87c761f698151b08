//! Document providers

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{TenantError, TenantResult};

/// Delivers value and template documents by path
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Read the raw contents of `path`. Fails with `SourceUnavailable`.
    async fn read(&self, path: &str) -> TenantResult<Vec<u8>>;
}

/// Reads documents from a local directory
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn read(&self, path: &str) -> TenantResult<Vec<u8>> {
        let full = self.root.join(path);
        tokio::fs::read(&full)
            .await
            .map_err(|e| TenantError::source_unavailable(full.display().to_string(), e))
    }
}
