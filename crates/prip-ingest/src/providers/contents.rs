//! Versioned single-file storage trait

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// File content together with its opaque version tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Raw bytes as stored
    pub content: Vec<u8>,
    /// Version tag to pass back as the write precondition
    pub version: String,
}

/// Trait for the storage holding the record collection file
///
/// Implementations:
/// - `GithubContents`: file in a GitHub repository (version = blob sha)
/// - `LocalContents`: file on the local filesystem (version = content hash)
/// - `MemoryContents`: process memory (version = content hash)
#[async_trait]
pub trait ContentsProvider: Send + Sync {
    /// Fetch the current file; `None` when it does not exist yet
    async fn fetch(&self) -> Result<Option<RemoteFile>>;

    /// Replace the whole file.
    ///
    /// `expected_version` is the tag from the last fetch, `None` to create
    /// the file. Fails with `ConcurrentModification` if the stored version
    /// differs. Returns the new version tag.
    async fn write(
        &self,
        content: &[u8],
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String>;

    /// Human-readable location for logs and errors
    fn location(&self) -> String;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Content-derived version tag used by the non-GitHub backends
pub fn content_version(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_version_is_stable() {
        assert_eq!(content_version(b"[]"), content_version(b"[]"));
        assert_ne!(content_version(b"[]"), content_version(b"[ ]"));
        assert_eq!(content_version(b"").len(), 64);
    }
}
