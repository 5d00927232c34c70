//! Local filesystem backend
//!
//! Keeps the collection in a single JSON file. The version tag is the
//! SHA-256 of the file content; writes within this process are serialized
//! and land via a temp file plus rename, so readers never see partial data.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Error, Result};

use super::contents::{content_version, ContentsProvider, RemoteFile};

/// File-backed contents store
pub struct LocalContents {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalContents {
    /// Create a store for the given file; the file itself is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_current(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::store_unavailable(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ContentsProvider for LocalContents {
    async fn fetch(&self) -> Result<Option<RemoteFile>> {
        if tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(Error::UnexpectedResourceType(self.location()));
        }

        Ok(self.read_current().await?.map(|content| RemoteFile {
            version: content_version(&content),
            content,
        }))
    }

    async fn write(
        &self,
        content: &[u8],
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String> {
        let _guard = self.write_lock.lock().await;

        let current = self.read_current().await?.map(|c| content_version(&c));
        if current.as_deref() != expected_version {
            return Err(Error::ConcurrentModification(self.location()));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::store_unavailable(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| Error::store_unavailable(format!("Failed to write {}: {}", temp.display(), e)))?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            Error::store_unavailable(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        tracing::debug!("{}: {}", self.location(), message);
        Ok(content_version(content))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}
