//! Error taxonomy for the QA pipeline.
//!
//! Only corpus-construction-time failures are surfaced as errors.
//! Everything downstream of "a corpus exists" degrades to a well-typed
//! [`AnswerResult`](crate::models::AnswerResult): an empty retrieval is
//! the `Insufficient` outcome and an extraction failure triggers the
//! deterministic fallback, so neither appears here.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, DocketError>;

/// Errors that can occur while building or querying the corpus.
#[derive(Error, Debug)]
pub enum DocketError {
    /// No text could be extracted from a document. Ingestion of that
    /// document aborts and nothing is persisted for it.
    #[error("no extractable text in document: {0}")]
    Ingestion(String),

    /// The embedding capability was unreachable or returned malformed
    /// output. Fatal for both ingestion and query-vector generation.
    #[error("embedding failure: {0}")]
    Embedding(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A persisted corpus could not be loaded back into the data model.
    #[error("corpus error: {0}")]
    Corpus(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
