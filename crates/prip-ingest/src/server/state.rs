//! Application state for the ingest server

use std::sync::Arc;
use std::time::Duration;

use crate::config::PripConfig;
use crate::error::{Error, Result};
use crate::pipeline::IngestPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: PripConfig,
    /// Extraction pipeline and record store
    pipeline: IngestPipeline,
    /// Client for document links
    http: reqwest::Client,
}

impl AppState {
    /// Create application state with the configured store
    pub fn new(config: PripConfig) -> Result<Self> {
        let pipeline = IngestPipeline::from_config(&config)?;
        Self::with_pipeline(config, pipeline)
    }

    /// Create application state around an existing pipeline
    pub fn with_pipeline(config: PripConfig, pipeline: IngestPipeline) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.server.download_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Application state ready (storage: {})",
            pipeline.store().provider().name()
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                http,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &PripConfig {
        &self.inner.config
    }

    /// Get the pipeline
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    /// Get the download client
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Refuse anyone but the configured owner
    pub fn authorize(&self, sender_id: &str) -> Result<()> {
        if self.inner.config.auth.is_owner(sender_id) {
            Ok(())
        } else {
            tracing::warn!("Refused submission from {}", sender_id);
            Err(Error::Unauthorized(sender_id.to_string()))
        }
    }
}
