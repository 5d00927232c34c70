//! Storage backends for the record collection file
//!
//! This module provides a trait-based abstraction that allows switching
//! between GitHub repository contents, a local file, and memory.

pub mod contents;
pub mod github;
pub mod local;
pub mod memory;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;

pub use contents::{content_version, ContentsProvider, RemoteFile};
pub use github::GithubContents;
pub use local::LocalContents;
pub use memory::MemoryContents;

/// Build the configured backend
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn ContentsProvider>> {
    let provider: Arc<dyn ContentsProvider> = match config.backend {
        StorageBackend::Github => Arc::new(GithubContents::new(&config.github)?),
        StorageBackend::Local => Arc::new(LocalContents::new(config.local.path.clone())),
        StorageBackend::Memory => Arc::new(MemoryContents::new()),
    };

    tracing::info!(
        "Using {} storage at {}",
        provider.name(),
        provider.location()
    );
    Ok(provider)
}
