//! Section and serial-number classification

use regex::{Regex, RegexBuilder};

use crate::config::ClassifierConfig;
use crate::error::{Error, Result};

/// Outcome of classifying one notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub section: String,
    pub number: Option<u32>,
}

/// Derives a section label and serial number from title and body.
///
/// Sections come from a closed rule list; a new section needs a config
/// change, never inference.
#[derive(Debug, Clone)]
pub struct RecordClassifier {
    /// (uppercased marker, label), checked in order
    rules: Vec<(String, String)>,
    default_label: String,
    number_pattern: Regex,
}

impl RecordClassifier {
    /// Build a classifier from configuration
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let rules = config
            .sections
            .iter()
            .filter(|rule| !rule.marker.trim().is_empty())
            .map(|rule| (rule.marker.trim().to_uppercase(), rule.label.clone()))
            .collect();

        let keyword = config.number_keyword.trim();
        if keyword.is_empty() {
            return Err(Error::Config("Number keyword must not be empty".to_string()));
        }

        // Up to five digits right after the keyword, not followed by a sixth
        let number_pattern = RegexBuilder::new(&format!(
            r"{}\s*([0-9]{{1,5}})(?:[^0-9]|$)",
            regex::escape(keyword)
        ))
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::Config(format!("Invalid number keyword: {}", e)))?;

        Ok(Self {
            rules,
            default_label: config.default_label.clone(),
            number_pattern,
        })
    }

    /// Classify a notice
    pub fn classify(&self, title: &str, body: &str) -> Classification {
        Classification {
            section: self.section(title, body),
            number: self.number(title, body),
        }
    }

    /// Label of the first rule whose marker occurs anywhere in the text
    pub fn section(&self, title: &str, body: &str) -> String {
        let haystack = format!("{}\n{}", title, body).to_uppercase();
        self.rules
            .iter()
            .find(|(marker, _)| haystack.contains(marker.as_str()))
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| self.default_label.clone())
    }

    /// First serial number found, title before body
    pub fn number(&self, title: &str, body: &str) -> Option<u32> {
        let haystack = format!("{}\n{}", title, body);
        self.number_pattern
            .captures(&haystack)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|n| *n > 0)
    }
}

impl Default for RecordClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default()).expect("Default classifier config is valid")
    }
}
