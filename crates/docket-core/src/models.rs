//! Core data models used throughout Docket.
//!
//! These types represent the documents, passages, and answers that flow
//! through the ingestion and question-answering pipeline.

use serde::{Deserialize, Serialize};

/// The logical section of a legal decision a chunk was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    /// Case caption and introductory paragraphs.
    Header,
    /// The court's own summary of the ruling.
    Syllabus,
    /// The operative "WHEREFORE / SO ORDERED" portion.
    Dispositive,
    /// Everything else: the body of the decision.
    Decision,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Header => "header",
            SectionType::Syllabus => "syllabus",
            SectionType::Dispositive => "dispositive",
            SectionType::Decision => "decision",
        }
    }
}

/// Per-document section texts used to classify chunks.
///
/// Sections may legitimately be empty (a short order has no syllabus);
/// an empty section simply never matches during classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionMap {
    pub header: String,
    pub syllabus: String,
    pub decision: String,
    pub dispositive: String,
}

/// A normalized source document, immutable once ingested.
#[derive(Debug, Clone)]
pub struct Document {
    /// Stable document identifier assigned at ingestion.
    pub id: String,
    /// Original filename, carried into every chunk as its `source`.
    pub filename: String,
    /// Full cleaned text of the document.
    pub full_text: String,
    /// Section texts for chunk classification.
    pub sections: SectionMap,
}

/// A bounded contiguous excerpt of a document, the unit of retrieval.
///
/// Created by the chunker; the embedding is attached afterwards by the
/// embedding step and never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Derived identifier: `{source}-chunk-{index}`.
    pub id: String,
    /// Chunk text, non-empty by construction.
    pub text: String,
    /// Filename of the originating document.
    pub source: String,
    /// Section classification for this chunk.
    pub section_type: SectionType,
    /// Embedding vector, absent until the embedding step runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Build an unembedded chunk with a derived id.
    pub fn new(source: &str, index: usize, text: String, section_type: SectionType) -> Self {
        Self {
            id: format!("{}-chunk-{}", source, index),
            text,
            source: source.to_string(),
            section_type,
            embedding: None,
        }
    }
}

/// A chunk scored against a query, produced per query and discarded after.
#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk {
    pub chunk: Chunk,
    /// Cosine similarity clamped to `[0.0, 1.0]`.
    pub similarity: f32,
}

/// Citation metadata attached to an [`AnswerResult`].
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub text: String,
    pub source: String,
    pub similarity: f32,
}

impl From<&RankedChunk> for Citation {
    fn from(rc: &RankedChunk) -> Self {
        Self {
            text: rc.chunk.text.clone(),
            source: rc.chunk.source.clone(),
            similarity: rc.similarity,
        }
    }
}

/// Which layer of the synthesis chain produced the answer.
///
/// Callers inspect this in order: an extracted span, the degraded
/// top-chunk fallback, or the terminal "nothing retrieved" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    /// The extractive-QA capability returned a span from the context.
    Extracted,
    /// Extraction failed; answer is the leading text of the top chunk.
    Fallback,
    /// No chunks met the similarity threshold.
    Insufficient,
}

/// The final result of a query, always well-typed regardless of which
/// synthesis layer produced it.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    /// Extraction score or fallback similarity; `0.0` when insufficient.
    pub confidence: Option<f32>,
    /// Source filename of the attributed chunk, absent when insufficient.
    pub source: Option<String>,
    /// Top-ranked chunks regardless of which path produced the answer.
    pub citations: Vec<Citation>,
    pub kind: AnswerKind,
}
