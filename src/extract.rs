//! Text-extraction collaborator.
//!
//! The pipeline does not read documents itself; it consumes a
//! [`TextExtractor`] that turns a document source into cleaned full
//! text plus a section map. PDF extraction and entity tagging live
//! outside this crate — the built-in [`PlainTextExtractor`] covers
//! plain-text case files and doubles as the reference implementation of
//! the cleanup and section heuristics.
//!
//! # Section heuristics
//!
//! - **header** — the first three paragraphs (case caption, docket
//!   number, parties).
//! - **syllabus** — the first paragraph containing `SYLLABUS`,
//!   `SYNOPSIS`, or `SUMMARY`.
//! - **dispositive** — the last paragraph containing `WHEREFORE` or
//!   `SO ORDERED`.
//! - **decision** — the full text; the body is not delimited further.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use docket_core::models::SectionMap;
use docket_core::DocketError;

/// Extracted raw material for one document.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub full_text: String,
    pub sections: SectionMap,
}

/// Collaborator that produces text and sections from a document source.
///
/// A failed extraction (no usable text) is an ingestion error; the
/// chunker is never invoked for such a document.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Extracted, DocketError>;
}

/// Extractor for already-textual case files (`.txt`).
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<Extracted, DocketError> {
        let raw = std::fs::read_to_string(path)?;
        let cleaned = clean_legal_text(&raw);
        if cleaned.is_empty() {
            return Err(DocketError::Ingestion(path.display().to_string()));
        }
        debug!(
            path = %path.display(),
            chars = cleaned.chars().count(),
            "extracted document text"
        );
        let sections = extract_sections(&cleaned);
        Ok(Extracted {
            full_text: cleaned,
            sections,
        })
    }
}

fn page_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*\d+\s*$").unwrap())
}

fn intra_line_ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").unwrap())
}

fn para_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}

fn ocr_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Za-z]),([A-Za-z])").unwrap())
}

/// Clean scanned legal text while preserving paragraph structure.
///
/// Normalizes line endings, drops page-number-only lines, collapses
/// runs of spaces and tabs, normalizes paragraph breaks to exactly one
/// blank line, and repairs the common OCR artifact of a comma glued
/// between two letters.
pub fn clean_legal_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = page_number_re().replace_all(&text, "");
    let text = intra_line_ws_re().replace_all(&text, " ");
    let text = para_break_re().replace_all(&text, "\n\n");
    let text = ocr_comma_re().replace_all(&text, "${1}, ${2}");
    text.trim().to_string()
}

const HEADER_PARAGRAPHS: usize = 3;
const SYLLABUS_KEYWORDS: [&str; 3] = ["SYLLABUS", "SYNOPSIS", "SUMMARY"];
const DISPOSITIVE_KEYWORDS: [&str; 2] = ["WHEREFORE", "SO ORDERED"];

/// Split cleaned text into the section map used for chunk tagging.
pub fn extract_sections(text: &str) -> SectionMap {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let header = paragraphs
        .iter()
        .take(HEADER_PARAGRAPHS)
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n");

    let syllabus = paragraphs
        .iter()
        .find(|p| {
            let upper = p.to_uppercase();
            SYLLABUS_KEYWORDS.iter().any(|kw| upper.contains(kw))
        })
        .map(|p| p.to_string())
        .unwrap_or_default();

    let dispositive = paragraphs
        .iter()
        .rev()
        .find(|p| {
            let upper = p.to_uppercase();
            DISPOSITIVE_KEYWORDS.iter().any(|kw| upper.contains(kw))
        })
        .map(|p| p.to_string())
        .unwrap_or_default();

    SectionMap {
        header,
        syllabus,
        dispositive,
        decision: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_drops_page_numbers() {
        let text = "First paragraph.\n12\nSecond line of it.";
        let cleaned = clean_legal_text(text);
        assert!(!cleaned.contains("12"));
        assert!(cleaned.contains("First paragraph."));
    }

    #[test]
    fn test_clean_preserves_paragraph_breaks() {
        let text = "Para one.\n\n\n\nPara two.";
        let cleaned = clean_legal_text(text);
        assert_eq!(cleaned, "Para one.\n\nPara two.");
    }

    #[test]
    fn test_clean_fixes_ocr_commas() {
        let cleaned = clean_legal_text("Petitioner,Respondent appeared.");
        assert_eq!(cleaned, "Petitioner, Respondent appeared.");
    }

    #[test]
    fn test_clean_collapses_spaces_and_tabs() {
        let cleaned = clean_legal_text("The   court\t\truled.");
        assert_eq!(cleaned, "The court ruled.");
    }

    #[test]
    fn test_sections_header_is_first_three_paragraphs() {
        let text = "Caption.\n\nDocket No. 1234.\n\nParties.\n\nBody of the decision.";
        let sections = extract_sections(text);
        assert_eq!(sections.header, "Caption.\n\nDocket No. 1234.\n\nParties.");
        assert_eq!(sections.decision, text);
    }

    #[test]
    fn test_sections_syllabus_by_keyword() {
        let text = "Caption.\n\nSYLLABUS: the gist of the ruling.\n\nBody.";
        let sections = extract_sections(text);
        assert_eq!(sections.syllabus, "SYLLABUS: the gist of the ruling.");
    }

    #[test]
    fn test_sections_dispositive_found_from_end() {
        let text =
            "Caption.\n\nWHEREFORE, quoted in the body.\n\nWHEREFORE, the petition is DENIED. SO ORDERED.";
        let sections = extract_sections(text);
        assert_eq!(
            sections.dispositive,
            "WHEREFORE, the petition is DENIED. SO ORDERED."
        );
    }

    #[test]
    fn test_sections_absent_when_keywords_missing() {
        let sections = extract_sections("Just a caption.\n\nAnd a body.");
        assert!(sections.syllabus.is_empty());
        assert!(sections.dispositive.is_empty());
    }

    #[test]
    fn test_extract_empty_file_is_ingestion_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "   \n\n  ").unwrap();
        let err = PlainTextExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, DocketError::Ingestion(_)));
    }

    #[test]
    fn test_extract_reads_and_cleans() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.txt");
        std::fs::write(&path, "Caption.\r\n\r\nBody   text.").unwrap();
        let out = PlainTextExtractor.extract(&path).unwrap();
        assert_eq!(out.full_text, "Caption.\n\nBody text.");
    }
}
