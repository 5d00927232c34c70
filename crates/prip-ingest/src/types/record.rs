//! Notice records and the ordered collection they are persisted in

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A persisted notice waypoint.
///
/// Built once by the pipeline and never mutated afterwards. Field names on
/// the wire follow the collection file (`fullText`, `createdAt`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Generated at append time
    pub id: Uuid,
    /// Classification label
    #[serde(default)]
    pub section: String,
    /// Serial number of the notice, if one was found
    #[serde(default)]
    pub number: Option<u32>,
    /// First non-empty line of the text
    pub title: String,
    /// Remaining text, capped
    #[serde(default)]
    pub desc: String,
    /// Truncated, normalized body
    #[serde(default)]
    pub full_text: String,
    pub lat: f64,
    pub lng: f64,
    /// Generated at append time
    pub created_at: DateTime<Utc>,
}

/// Everything the pipeline derives from one input, before the store
/// assigns identity and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub section: String,
    pub number: Option<u32>,
    pub title: String,
    pub desc: String,
    pub full_text: String,
    pub lat: f64,
    pub lng: f64,
}

impl RecordDraft {
    /// Stamp the draft with a fresh id and the current time
    pub fn into_record(self) -> Record {
        self.into_record_at(Utc::now())
    }

    /// Stamp the draft with a fresh id and the given time
    pub fn into_record_at(self, created_at: DateTime<Utc>) -> Record {
        Record {
            id: Uuid::new_v4(),
            section: self.section,
            number: self.number,
            title: self.title,
            desc: self.desc,
            full_text: self.full_text,
            lat: self.lat,
            lng: self.lng,
            created_at,
        }
    }
}

/// Ordered collection of records, newest first.
///
/// Entries are kept as raw JSON values so that fields written by other
/// tools (or older record shapes) survive a read-modify-write unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    entries: Vec<serde_json::Value>,
}

impl RecordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the stored representation.
    ///
    /// Blank content is an empty collection. Anything that is not a JSON
    /// array is an error; callers decide whether to recover.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::internal(format!("Collection is not valid UTF-8: {}", e)))?;
        let text = text.trim_start_matches('\u{feff}');

        if text.trim().is_empty() {
            return Ok(Self::new());
        }

        let entries: Vec<serde_json::Value> = serde_json::from_str(text)?;
        Ok(Self { entries })
    }

    /// Insert a record at the front
    pub fn prepend(&mut self, record: &Record) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.entries.insert(0, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entries in stored order
    pub fn entries(&self) -> &[serde_json::Value] {
        &self.entries
    }

    /// Entries that decode as records, in stored order
    pub fn records(&self) -> Vec<Record> {
        self.entries
            .iter()
            .filter_map(|value| serde_json::from_value(value.clone()).ok())
            .collect()
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}
