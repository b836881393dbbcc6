//! Answer synthesis with a layered fallback chain.
//!
//! Turns a list of ranked chunks plus the outcome of the extractive-QA
//! capability into an [`AnswerResult`]. The chain has three layers,
//! inspected in order:
//!
//! 1. **Extracted** — the capability returned a span; attribute it to
//!    the first chunk (in rank order) whose text literally contains it.
//! 2. **Fallback** — the capability was unavailable, errored, timed
//!    out, or declared no answer; answer with the leading text of the
//!    top-ranked chunk. This layer performs no external calls and
//!    always succeeds given at least one ranked chunk.
//! 3. **Insufficient** — nothing was retrieved; a fixed terminal
//!    result, not an error.
//!
//! The capability call itself happens outside this module: callers pack
//! a context with [`pack_context`], invoke their extractor, and hand
//! the outcome in as an explicit [`Extraction`] value. Every function
//! here is a pure function of its inputs.

use crate::models::{AnswerKind, AnswerResult, Citation, RankedChunk};

/// Number of leading characters used for the fallback answer.
pub const FALLBACK_ANSWER_CHARS: usize = 500;

/// Maximum number of ranked chunks returned as citations.
pub const MAX_CITATIONS: usize = 3;

/// Fixed answer text for the terminal "nothing retrieved" outcome.
pub const INSUFFICIENT_ANSWER: &str =
    "I could not find any relevant information to answer this question.";

/// Outcome of the extractive-QA capability, as seen by the synthesizer.
///
/// Unavailability, runtime errors, timeouts, and a declared no-answer
/// all collapse to [`Extraction::Failed`]; the synthesizer does not
/// distinguish between them.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The capability extracted a span with a confidence score.
    Answered { answer: String, score: f32 },
    /// The capability could not produce an answer.
    Failed,
}

/// Greedily pack ranked chunk texts into a bounded context string.
///
/// Chunks are taken strictly in rank order, stopping before the first
/// chunk whose addition would exceed `max_context_length`; chunks are
/// never reordered to fit more content. Texts are joined with blank
/// lines.
pub fn pack_context(ranked: &[RankedChunk], max_context_length: usize) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for rc in ranked {
        let len = rc.chunk.text.chars().count();
        if total + len > max_context_length {
            break;
        }
        parts.push(&rc.chunk.text);
        total += len;
    }

    parts.join("\n\n")
}

/// Synthesize the final [`AnswerResult`] from ranked chunks and the
/// extraction outcome.
///
/// The returned result always carries the top ranked chunks as
/// citations regardless of which layer produced the answer.
pub fn synthesize(ranked: &[RankedChunk], extraction: Extraction) -> AnswerResult {
    let Some(top) = ranked.first() else {
        return AnswerResult {
            answer: INSUFFICIENT_ANSWER.to_string(),
            confidence: Some(0.0),
            source: None,
            citations: Vec::new(),
            kind: AnswerKind::Insufficient,
        };
    };

    let citations: Vec<Citation> = ranked.iter().take(MAX_CITATIONS).map(Citation::from).collect();

    match extraction {
        Extraction::Answered { answer, score } => {
            let source = attribute_source(ranked, &answer).unwrap_or(&top.chunk.source);
            AnswerResult {
                answer,
                confidence: Some(score.clamp(0.0, 1.0)),
                source: Some(source.clone()),
                citations,
                kind: AnswerKind::Extracted,
            }
        }
        Extraction::Failed => AnswerResult {
            answer: leading_chars(&top.chunk.text, FALLBACK_ANSWER_CHARS),
            confidence: Some(top.similarity),
            source: Some(top.chunk.source.clone()),
            citations,
            kind: AnswerKind::Fallback,
        },
    }
}

/// Find the source of the first chunk, in rank order, whose text
/// literally contains the answer span.
///
/// A lower-ranked chunk can win attribution when it is the first to
/// contain the span; higher-ranked chunks that do not contain it are
/// skipped. Returns `None` when no chunk contains the span.
fn attribute_source<'a>(ranked: &'a [RankedChunk], answer: &str) -> Option<&'a String> {
    ranked
        .iter()
        .find(|rc| rc.chunk.text.contains(answer))
        .map(|rc| &rc.chunk.source)
}

/// The first `n` characters of `text`, on char boundaries.
fn leading_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}
