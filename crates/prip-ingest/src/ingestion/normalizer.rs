//! Format-specific text normalization
//!
//! Turns an inbound byte buffer into plain UTF-8 text. DOCX goes through
//! `docx-rs`; RTF and legacy `.doc` go through a control-word strip that is
//! deliberately heuristic: no nested binary objects, no multi-byte code
//! pages beyond single-byte `\'XX` escapes.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::types::{FormatTag, InboundDocument};

/// RTF tokens that carry or hide text.
///
/// Order matters: the alternation is leftmost-first, so `\uN` must be tried
/// before the generic control word.
static RTF_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        \\'(?P<hex>[0-9a-fA-F]{2})
        | \\u(?P<uni>-?\d+)\x20?(?:\\'[0-9a-fA-F]{2}|\?)?
        | \\(?P<word>[a-zA-Z]+)(?:-?\d+)?\x20?
        | \\(?P<literal>[\\{}])
        | \\(?P<symbol>[^a-zA-Z0-9])
        | (?P<raw>\r\n|\r|\n)
        | [{}]
        ",
    )
    .expect("Invalid RTF token regex")
});

static CODEPAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\ansicpg(\d+)").expect("Invalid codepage regex"));

static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid newline regex"));

/// Groups whose content is never document text
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "listtable",
    "listoverridetable",
];

/// Windows-1251 code points for bytes 0x80..=0xBF. Bytes 0xC0..=0xFF map
/// linearly onto U+0410..=U+044F.
const CP1251_HIGH: [u16; 64] = [
    0x0402, 0x0403, 0x201A, 0x0453, 0x201E, 0x2026, 0x2020, 0x2021,
    0x20AC, 0x2030, 0x0409, 0x2039, 0x040A, 0x040C, 0x040B, 0x040F,
    0x0452, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    0xFFFD, 0x2122, 0x0459, 0x203A, 0x045A, 0x045C, 0x045B, 0x045F,
    0x00A0, 0x040E, 0x045E, 0x0408, 0x00A4, 0x0490, 0x00A6, 0x00A7,
    0x0401, 0x00A9, 0x0404, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x0407,
    0x00B0, 0x00B1, 0x0406, 0x0456, 0x0491, 0x00B5, 0x00B6, 0x00B7,
    0x0451, 0x2116, 0x0454, 0x00BB, 0x0458, 0x0405, 0x0455, 0x0457,
];

/// Single-byte code page used for `\'XX` escapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodePage {
    Cyrillic,
    Latin1,
}

impl CodePage {
    fn detect(raw: &str) -> Self {
        match CODEPAGE
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        {
            Some("1251") => Self::Cyrillic,
            _ => Self::Latin1,
        }
    }

    fn decode(self, byte: u8) -> char {
        match self {
            Self::Latin1 => char::from(byte),
            Self::Cyrillic => match byte {
                0x00..=0x7F => char::from(byte),
                0x80..=0xBF => char::from_u32(CP1251_HIGH[(byte - 0x80) as usize] as u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER),
                _ => char::from_u32(0x0410 + (byte - 0xC0) as u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER),
            },
        }
    }
}

/// Converts raw document bytes into plain text
pub struct TextNormalizer;

impl TextNormalizer {
    /// Normalize an uploaded document, detecting the format from its name
    pub fn normalize_document(document: &InboundDocument) -> Result<String> {
        let format = FormatTag::from_filename(&document.filename)
            .ok_or_else(|| Error::UnsupportedFormat(document.extension()))?;

        tracing::debug!(
            "Normalizing {} ({}, {} bytes)",
            document.filename,
            format.display_name(),
            document.data.len()
        );

        Self::normalize(&document.data, format).map_err(|e| match e {
            Error::ExtractionEmpty(_) => Error::ExtractionEmpty(document.filename.clone()),
            other => other,
        })
    }

    /// Normalize a buffer of a declared format.
    ///
    /// DOCX failures and empty DOCX results are `ExtractionEmpty`. The
    /// textual formats always succeed, possibly with an empty string.
    pub fn normalize(data: &[u8], format: FormatTag) -> Result<String> {
        match format {
            FormatTag::Docx => Self::extract_docx(data),
            tag if tag.is_rtf_like() => Ok(Self::strip_rtf(&decode_lossy(data))),
            _ => Ok(Self::normalize_plain(&decode_lossy(data))),
        }
    }

    /// Pull paragraph text out of a DOCX container
    fn extract_docx(data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| {
            tracing::warn!("docx extraction failed: {}", e);
            Error::ExtractionEmpty("document.docx".to_string())
        })?;

        let mut lines: Vec<String> = Vec::new();

        for child in &doc.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => {
                    lines.push(paragraph_text(p));
                }
                docx_rs::DocumentChild::Table(table) => {
                    // Notices sometimes put the coordinates in a table
                    for row in &table.rows {
                        if let docx_rs::TableChild::TableRow(row) = row {
                            for cell in &row.cells {
                                if let docx_rs::TableRowChild::TableCell(cell) = cell {
                                    for content in &cell.children {
                                        if let docx_rs::TableCellContent::Paragraph(p) = content {
                                            lines.push(paragraph_text(p));
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let content = collapse_blank_lines(&lines.join("\n"));
        if content.is_empty() {
            return Err(Error::ExtractionEmpty("document.docx".to_string()));
        }

        Ok(content)
    }

    /// Best-effort RTF to text.
    ///
    /// Paragraph breaks become newlines, `\'XX` escapes decode through the
    /// declared code page, `\uN` escapes decode to their code point, every
    /// other control word and all grouping braces are removed.
    pub fn strip_rtf(raw: &str) -> String {
        let is_rtf = raw.trim_start().starts_with("{\\rtf");
        let codepage = CodePage::detect(raw);

        let body = if is_rtf {
            drop_destinations(raw)
        } else {
            raw.to_string()
        };

        let text = RTF_TOKEN.replace_all(&body, |caps: &Captures| {
            if let Some(hex) = caps.name("hex") {
                return u8::from_str_radix(hex.as_str(), 16)
                    .map(|byte| codepage.decode(byte).to_string())
                    .unwrap_or_default();
            }
            if let Some(uni) = caps.name("uni") {
                return uni
                    .as_str()
                    .parse::<i32>()
                    .ok()
                    .map(|n| if n < 0 { n + 65536 } else { n })
                    .and_then(|n| char::from_u32(n as u32))
                    .map(String::from)
                    .unwrap_or_default();
            }
            if let Some(word) = caps.name("word") {
                return match word.as_str() {
                    "par" | "line" | "sect" | "page" | "row" => "\n".to_string(),
                    "tab" | "cell" => "\t".to_string(),
                    _ => String::new(),
                };
            }
            if let Some(literal) = caps.name("literal") {
                return literal.as_str().to_string();
            }
            if let Some(symbol) = caps.name("symbol") {
                return match symbol.as_str() {
                    "~" => " ".to_string(),
                    "_" => "-".to_string(),
                    "\n" | "\r" => "\n".to_string(),
                    _ => String::new(),
                };
            }
            if caps.name("raw").is_some() {
                // Source line breaks only delimit tokens in real RTF; in
                // anything else that merely claims to be RTF they are text.
                return if is_rtf { String::new() } else { "\n".to_string() };
            }
            String::new()
        });

        let text = text
            .replace('\0', "")
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect::<String>();

        collapse_blank_lines(&text)
    }

    /// Plain text: line endings unified, BOM dropped
    fn normalize_plain(raw: &str) -> String {
        let text = raw
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n");
        text.trim().to_string()
    }
}

fn decode_lossy(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => text.push('\t'),
                    docx_rs::RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

/// Trim each line, collapse runs of 3+ newlines to 2, trim the whole
fn collapse_blank_lines(text: &str) -> String {
    let trimmed_lines = text
        .lines()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUNS
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

/// Remove header groups (font table, colors, `{\*...}` destinations, ...)
fn drop_destinations(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut copied_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'{' if is_skipped_group(&raw[i + 1..]) => {
                out.push_str(&raw[copied_from..i]);
                i = skip_group(bytes, i);
                copied_from = i;
            }
            _ => i += 1,
        }
    }

    if copied_from < raw.len() {
        out.push_str(&raw[copied_from..]);
    }
    out
}

fn is_skipped_group(rest: &str) -> bool {
    let rest = rest.trim_start();
    if rest.starts_with("\\*") {
        return true;
    }
    SKIPPED_DESTINATIONS.iter().any(|name| {
        rest.strip_prefix('\\')
            .and_then(|r| r.strip_prefix(name))
            .map(|after| !after.starts_with(|c: char| c.is_ascii_alphabetic()))
            .unwrap_or(false)
    })
}

/// Index just past the brace closing the group opened at `start`
fn skip_group(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CYRILLIC_RTF: &str = r"{\rtf1\ansi\ansicpg1251\deff0{\fonttbl{\f0\fnil\fcharset204 Times New Roman;}}
{\*\generator Riched20 10.0;}\viewkind4\uc1
\pard\f0\fs24 \'cf\'d0\'c8\'cf \'b9 17\par
44\'b037,50' N 37\'b045,00' E\par
NNNN\par
}";

    #[test]
    fn test_strip_cyrillic_rtf() {
        let text = TextNormalizer::strip_rtf(CYRILLIC_RTF);
        assert_eq!(text, "ПРИП № 17\n44°37,50' N 37°45,00' E\nNNNN");
    }

    #[test]
    fn test_strip_unicode_escapes() {
        let rtf = r"{\rtf1\ansi\uc1 \u1055?\u1056?\u1048?\u1055? 1\par next\line line}";
        assert_eq!(TextNormalizer::strip_rtf(rtf), "ПРИП 1\nnext\nline");
    }

    #[test]
    fn test_strip_keeps_escaped_literals() {
        let rtf = r"{\rtf1 a \{b\} c\\d}";
        assert_eq!(TextNormalizer::strip_rtf(rtf), r"a {b} c\d");
    }

    #[test]
    fn test_latin1_escapes_without_codepage() {
        let rtf = r"{\rtf1\ansi 12\'b0 34\par}";
        assert_eq!(TextNormalizer::strip_rtf(rtf), "12° 34");
    }

    #[test]
    fn test_blank_line_runs_collapse() {
        let rtf = r"{\rtf1 one\par\par\par\par two}";
        assert_eq!(TextNormalizer::strip_rtf(rtf), "one\n\ntwo");
    }

    #[test]
    fn test_pard_is_not_a_paragraph_break() {
        let rtf = r"{\rtf1\pard\plain one two}";
        assert_eq!(TextNormalizer::strip_rtf(rtf), "one two");
    }

    #[test]
    fn test_non_rtf_doc_keeps_line_breaks() {
        let text = TextNormalizer::normalize(b"line one\r\nline two\r\n", FormatTag::Doc).unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn test_plain_text() {
        let text = TextNormalizer::normalize("\u{feff}  hello\r\nworld \n".as_bytes(), FormatTag::Plain)
            .unwrap();
        assert_eq!(text, "hello\nworld");
    }

    #[test]
    fn test_invalid_docx_is_extraction_empty() {
        let result = TextNormalizer::normalize(b"definitely not a zip", FormatTag::Docx);
        assert!(matches!(result, Err(Error::ExtractionEmpty(_))));
    }

    #[test]
    fn test_docx_round_trip_through_docx_rs() {
        let mut buffer = std::io::Cursor::new(Vec::new());
        docx_rs::Docx::new()
            .add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("ПРИП № 5")),
            )
            .add_paragraph(
                docx_rs::Paragraph::new()
                    .add_run(docx_rs::Run::new().add_text("44°37,50' N 37°45,00' E")),
            )
            .build()
            .pack(&mut buffer)
            .unwrap();

        let text = TextNormalizer::normalize(buffer.get_ref(), FormatTag::Docx).unwrap();
        assert_eq!(text, "ПРИП № 5\n44°37,50' N 37°45,00' E");
    }

    #[test]
    fn test_unsupported_extension() {
        let doc = InboundDocument::new("scan.pdf", b"%PDF-1.4".to_vec());
        match TextNormalizer::normalize_document(&doc) {
            Err(Error::UnsupportedFormat(ext)) => assert_eq!(ext, "pdf"),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }
}
