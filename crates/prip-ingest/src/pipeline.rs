//! Ingest-and-commit orchestration
//!
//! One inbound message or document runs the whole chain:
//! normalize -> truncate -> coordinates -> classify -> append, and ends in a
//! short reply. Every failure is converted to a reply here; nothing escapes
//! to the transport.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PripConfig;
use crate::error::{Error, Result};
use crate::ingestion::{
    is_manual_command, parse_coordinates, parse_manual_command, RecordClassifier,
    SentinelTruncator, TextNormalizer,
};
use crate::storage::RecordStore;
use crate::types::{InboundDocument, Record, RecordDraft};

/// Reply to `/start` and `/help`
pub const HELP_TEXT: &str = "Пришлите ПРИП текстом или документом (DOCX, RTF, DOC), \
координаты будут найдены автоматически.\n\
Ручное добавление:\n/add Название | lat | lng | описание";

static HELP_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*/(?:start|help)(?:@\w+)?(?:\s|$)").expect("Invalid command regex")
});

/// Whether a message is `/start` or `/help`
pub fn is_help_command(text: &str) -> bool {
    HELP_COMMAND.is_match(text)
}

/// One inbound unit of work
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Typed text, including commands
    Message { text: String },
    /// Uploaded file
    Document { filename: String, bytes: Vec<u8> },
}

impl InboundEvent {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    pub fn document(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Document {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// The extraction pipeline bound to a record store
pub struct IngestPipeline {
    truncator: SentinelTruncator,
    classifier: RecordClassifier,
    store: RecordStore,
    max_desc_chars: usize,
}

impl IngestPipeline {
    /// Create a pipeline over an existing store
    pub fn new(config: &PripConfig, store: RecordStore) -> Result<Self> {
        Ok(Self {
            truncator: SentinelTruncator::new(&config.pipeline.sentinel_tokens)?,
            classifier: RecordClassifier::new(&config.classifier)?,
            store,
            max_desc_chars: config.pipeline.max_desc_chars,
        })
    }

    /// Create a pipeline and the configured store
    pub fn from_config(config: &PripConfig) -> Result<Self> {
        let store = RecordStore::from_config(&config.storage)?;
        Self::new(config, store)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Extract a record draft from normalized text without storing it
    pub fn extract(&self, text: &str) -> Result<RecordDraft> {
        let body = self.truncator.truncate(text);

        let coordinates = parse_coordinates(body)
            .filter(|c| c.is_in_range())
            .ok_or(Error::CoordinatesNotFound)?;

        let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());
        let title = lines.next().unwrap_or_default().to_string();
        let rest = lines.collect::<Vec<_>>().join("\n");

        let classification = self.classifier.classify(&title, &rest);

        Ok(RecordDraft {
            section: classification.section,
            number: classification.number,
            title,
            desc: self.cap_description(&rest),
            full_text: body.to_string(),
            lat: coordinates.lat,
            lng: coordinates.lng,
        })
    }

    /// Ingest typed free-form text
    pub async fn ingest_text(&self, text: &str) -> Result<Record> {
        let draft = self.extract(text)?;
        self.commit(draft).await
    }

    /// Ingest an uploaded document
    pub async fn ingest_document(&self, document: &InboundDocument) -> Result<Record> {
        let text = TextNormalizer::normalize_document(document)?;
        if text.trim().is_empty() {
            tracing::warn!("No text extracted from '{}'", document.filename);
            return Err(Error::ExtractionEmpty(document.filename.clone()));
        }
        tracing::debug!(
            "Extracted {} chars from '{}'",
            text.chars().count(),
            document.filename
        );

        let draft = self.extract(&text)?;
        self.commit(draft).await
    }

    /// Ingest a `/add title | lat | lng | description` command
    pub async fn ingest_manual(&self, text: &str) -> Result<Record> {
        let entry = parse_manual_command(text)?;
        let classification = self.classifier.classify(&entry.title, &entry.desc);

        let draft = RecordDraft {
            section: classification.section,
            number: classification.number,
            full_text: entry.full_text(),
            desc: self.cap_description(&entry.desc),
            title: entry.title,
            lat: entry.lat,
            lng: entry.lng,
        };
        self.commit(draft).await
    }

    /// Dispatch one event and produce the reply; `None` means stay silent
    pub async fn handle(&self, event: InboundEvent) -> Option<String> {
        match event {
            InboundEvent::Message { text } => {
                if is_help_command(&text) {
                    return Some(HELP_TEXT.to_string());
                }

                if is_manual_command(&text) {
                    return Some(reply(self.ingest_manual(&text).await));
                }

                match self.ingest_text(&text).await {
                    // Unrelated chatter gets no reply
                    Err(Error::CoordinatesNotFound) => None,
                    result => Some(reply(result)),
                }
            }
            InboundEvent::Document { filename, bytes } => {
                let document = InboundDocument::new(filename, bytes);
                Some(reply(self.ingest_document(&document).await))
            }
        }
    }

    async fn commit(&self, draft: RecordDraft) -> Result<Record> {
        self.store.append(draft).await.map_err(|e| {
            tracing::error!("Failed to commit record: {}", e);
            e
        })
    }

    fn cap_description(&self, desc: &str) -> String {
        desc.chars().take(self.max_desc_chars).collect()
    }
}

fn reply(result: Result<Record>) -> String {
    match result {
        Ok(record) => format_confirmation(&record),
        Err(e) => {
            tracing::warn!("Submission rejected: {}", e);
            e.user_message()
        }
    }
}

/// Human-readable confirmation of a stored record
pub fn format_confirmation(record: &Record) -> String {
    let mut heading = record.section.clone();
    if let Some(number) = record.number {
        heading.push_str(&format!(" № {}", number));
    }

    let coordinates = crate::ingestion::Coordinates::new(record.lat, record.lng);
    format!(
        "✅ Добавлено: {}\n{}\n{}",
        record.title,
        heading,
        coordinates.to_dmm_string()
    )
}
