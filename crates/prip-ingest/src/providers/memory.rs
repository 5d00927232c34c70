//! In-process backend for tests and dry runs

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};

use super::contents::{content_version, ContentsProvider, RemoteFile};

/// Contents store held in memory
#[derive(Default)]
pub struct MemoryContents {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    content: Option<Vec<u8>>,
    commits: Vec<String>,
}

impl MemoryContents {
    /// Empty store (file does not exist)
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with some content
    pub fn with_content(content: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        store.state.lock().content = Some(content.into());
        store
    }

    /// Current content, bypassing versioning
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.state.lock().content.clone()
    }

    /// Overwrite content as another writer would
    pub fn replace(&self, content: impl Into<Vec<u8>>) {
        self.state.lock().content = Some(content.into());
    }

    /// Commit messages of successful writes, oldest first
    pub fn commits(&self) -> Vec<String> {
        self.state.lock().commits.clone()
    }
}

#[async_trait]
impl ContentsProvider for MemoryContents {
    async fn fetch(&self) -> Result<Option<RemoteFile>> {
        Ok(self.state.lock().content.as_ref().map(|content| RemoteFile {
            content: content.clone(),
            version: content_version(content),
        }))
    }

    async fn write(
        &self,
        content: &[u8],
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<String> {
        let mut state = self.state.lock();

        let current = state.content.as_deref().map(content_version);
        if current.as_deref() != expected_version {
            return Err(Error::ConcurrentModification(self.location()));
        }

        state.content = Some(content.to_vec());
        state.commits.push(message.to_string());
        Ok(content_version(content))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_requires_current_version() {
        let store = MemoryContents::with_content("[]");
        let fetched = store.fetch().await.unwrap().unwrap();

        store.replace("[{}]");
        let err = store
            .write(b"[1]", Some(&fetched.version), "add PRIP: x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConcurrentModification(_)));
        assert_eq!(store.snapshot().unwrap(), b"[{}]");
        assert!(store.commits().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let store = MemoryContents::new();
        assert!(store.fetch().await.unwrap().is_none());

        let v1 = store.write(b"[1]", None, "first").await.unwrap();
        store.write(b"[2]", Some(&v1), "second").await.unwrap();
        assert_eq!(store.snapshot().unwrap(), b"[2]");
        assert_eq!(store.commits(), vec!["first", "second"]);
    }
}
