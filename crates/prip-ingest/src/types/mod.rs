//! Core types for notice ingestion

pub mod document;
pub mod record;

pub use document::{FormatTag, InboundDocument};
pub use record::{Record, RecordCollection, RecordDraft};
