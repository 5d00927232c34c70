//! End-of-message truncation

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// Cuts a notice at the first line consisting only of an end-of-message token
#[derive(Debug, Clone)]
pub struct SentinelTruncator {
    pattern: Regex,
}

impl SentinelTruncator {
    /// Build a truncator for the given tokens (matched case-insensitively)
    pub fn new<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::Config("No sentinel tokens configured".to_string()));
        }

        let alternatives = tokens
            .iter()
            .map(|t| regex::escape(t.as_ref().trim()))
            .collect::<Vec<_>>()
            .join("|");

        // The token must be alone on its line so that a mention inside a
        // sentence does not cut the notice short.
        let pattern = RegexBuilder::new(&format!(r"^[ \t]*(?:{})[ \t\r]*$", alternatives))
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| Error::Config(format!("Invalid sentinel token: {}", e)))?;

        Ok(Self { pattern })
    }

    /// Text before the sentinel line, trimmed; the whole input trimmed if
    /// there is no sentinel line
    pub fn truncate<'a>(&self, text: &'a str) -> &'a str {
        match self.pattern.find(text) {
            Some(m) => text[..m.start()].trim(),
            None => text.trim(),
        }
    }

    /// Whether the text contains a sentinel line
    pub fn has_sentinel(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

impl Default for SentinelTruncator {
    fn default() -> Self {
        Self {
            pattern: RegexBuilder::new(r"^[ \t]*(?:NNNN|НННН)[ \t\r]*$")
                .case_insensitive(true)
                .multi_line(true)
                .build()
                .expect("Invalid default sentinel regex"),
        }
    }
}

/// Truncate with the default `NNNN`/`НННН` tokens
pub fn truncate_at_sentinel(text: &str) -> &str {
    static DEFAULT: once_cell::sync::Lazy<SentinelTruncator> =
        once_cell::sync::Lazy::new(SentinelTruncator::default);
    DEFAULT.truncate(text)
}
