//! Append-only access to the shared record collection
//!
//! Every append is one read-modify-write cycle against the contents
//! provider, guarded by the version tag from the read. There is no retry:
//! a lost race surfaces as `ConcurrentModification`.

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::Result;
use crate::providers::{self, ContentsProvider, RemoteFile};
use crate::types::{Record, RecordCollection, RecordDraft};

/// Commit message prefix for appended records
const COMMIT_PREFIX: &str = "add PRIP: ";

/// Record collection stored behind a contents provider
#[derive(Clone)]
pub struct RecordStore {
    provider: Arc<dyn ContentsProvider>,
}

impl RecordStore {
    /// Create a store over an existing provider
    pub fn new(provider: Arc<dyn ContentsProvider>) -> Self {
        Self { provider }
    }

    /// Create a store over the configured backend
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Ok(Self::new(providers::from_config(config)?))
    }

    /// Underlying provider
    pub fn provider(&self) -> &Arc<dyn ContentsProvider> {
        &self.provider
    }

    /// Current collection, newest first.
    ///
    /// Content that is not a JSON array reads as an empty collection.
    pub async fn load(&self) -> Result<RecordCollection> {
        let remote = self.provider.fetch().await?;
        Ok(self.decode(remote.as_ref()))
    }

    /// Stamp the draft with id and timestamp, then prepend it.
    ///
    /// Fails with `ConcurrentModification` when the collection changed
    /// between read and write; the stored collection is then untouched.
    pub async fn append(&self, draft: RecordDraft) -> Result<Record> {
        let remote = self.provider.fetch().await?;
        let mut collection = self.decode(remote.as_ref());

        let record = draft.into_record();
        collection.prepend(&record)?;

        let body = collection.to_pretty_json()?;
        let message = format!("{}{}", COMMIT_PREFIX, record.title);
        let version = self
            .provider
            .write(
                body.as_bytes(),
                remote.as_ref().map(|r| r.version.as_str()),
                &message,
            )
            .await?;

        tracing::info!(
            "Appended record {} to {} ({} entries, version {})",
            record.id,
            self.provider.location(),
            collection.len(),
            version
        );

        Ok(record)
    }

    fn decode(&self, remote: Option<&RemoteFile>) -> RecordCollection {
        let Some(remote) = remote else {
            return RecordCollection::new();
        };

        match RecordCollection::parse(&remote.content) {
            Ok(collection) => collection,
            Err(e) => {
                // Availability over history: the next write replaces it
                tracing::warn!(
                    "Discarding unreadable collection at {}: {}",
                    self.provider.location(),
                    e
                );
                RecordCollection::new()
            }
        }
    }
}
