//! Manual `/add title | lat | lng | description` command

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static COMMAND_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*/add\b(?:@\w+)?\s*").expect("Invalid command regex"));

/// Fields of a manual entry
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub title: String,
    pub lat: f64,
    pub lng: f64,
    pub desc: String,
}

impl ManualEntry {
    /// Title and description as one body
    pub fn full_text(&self) -> String {
        if self.desc.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.desc)
        }
    }
}

/// Whether a message is a manual add command
pub fn is_manual_command(text: &str) -> bool {
    COMMAND_PREFIX.is_match(text)
}

/// Parse a manual command; the `/add` prefix (with optional `@botname`) is
/// optional so the bare field list is accepted too
pub fn parse_manual_command(text: &str) -> Result<ManualEntry> {
    let raw = COMMAND_PREFIX.replace(text, "");
    let parts: Vec<&str> = raw.split('|').map(str::trim).collect();

    let (title, lat, lng) = match parts.as_slice() {
        [title, lat, lng, ..] if !title.is_empty() && !lat.is_empty() && !lng.is_empty() => {
            (*title, *lat, *lng)
        }
        _ => {
            return Err(Error::malformed_manual(
                "expected at least title, lat and lng separated by '|'",
            ))
        }
    };

    let lat = parse_degrees(lat, "lat", 90.0)?;
    let lng = parse_degrees(lng, "lng", 180.0)?;
    let desc = parts[3..].join(" | ").trim().to_string();

    Ok(ManualEntry {
        title: title.to_string(),
        lat,
        lng,
        desc,
    })
}

fn parse_degrees(raw: &str, field: &str, limit: f64) -> Result<f64> {
    let value: f64 = raw
        .replace(',', ".")
        .parse()
        .map_err(|_| Error::malformed_manual(format!("{} must be a number, got '{}'", field, raw)))?;

    if !value.is_finite() {
        return Err(Error::malformed_manual(format!("{} must be finite", field)));
    }
    if value.abs() > limit {
        return Err(Error::malformed_manual(format!(
            "{} must be within ±{}, got {}",
            field, limit, value
        )));
    }

    Ok(value)
}
