//! prip-ingest: waypoint notice extraction
//!
//! Turns free-form operational notices (typed text or RTF/DOCX/DOC
//! documents) into records with a coordinate pair, section and serial
//! number, and appends them to a single shared, versioned collection.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::PripConfig;
pub use error::{Error, Result};
pub use pipeline::{format_confirmation, InboundEvent, IngestPipeline};
pub use storage::RecordStore;
pub use types::{FormatTag, InboundDocument, Record, RecordCollection, RecordDraft};
