//! Ingestion and query orchestration.
//!
//! Wires the pure core (chunking, ranking, synthesis) to the injected
//! capabilities (text extraction, embedding, extractive QA). Two
//! surfaces:
//!
//! - [`Pipeline::ingest_file`] — extract → chunk → embed. Extraction
//!   and embedding failures propagate; nothing is handed to the store
//!   for a failed document.
//! - [`Pipeline::query`] — embed the question → rank a corpus
//!   snapshot → pack context → extract under a deadline → synthesize.
//!   Downstream of the query embedding, every outcome is a well-typed
//!   [`AnswerResult`].
//!
//! The pipeline holds no corpus and no per-query state; callers pass a
//! snapshot in, so concurrent ingestion can never be observed mid-update.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use docket_core::answer::{pack_context, synthesize, Extraction};
use docket_core::chunk::{chunk_document, ContainmentClassifier};
use docket_core::models::{AnswerResult, Chunk, Document};
use docket_core::rank::rank;
use docket_core::DocketError;

use crate::config::Config;
use crate::embedding::{self, Embedder};
use crate::extract::TextExtractor;
use crate::qa::{extract_with_timeout, AnswerExtractor};

/// Per-query knobs, defaulted from `[retrieval]` config.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub top_k: usize,
    pub threshold: f32,
    pub max_context_length: usize,
}

impl From<&Config> for QueryParams {
    fn from(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            threshold: config.retrieval.threshold,
            max_context_length: config.retrieval.max_context_length,
        }
    }
}

/// The assembled QA pipeline with its injected capabilities.
pub struct Pipeline {
    config: Config,
    classifier: ContainmentClassifier,
    text_extractor: Box<dyn TextExtractor>,
    embedder: Box<dyn Embedder>,
    answer_extractor: Box<dyn AnswerExtractor>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        text_extractor: Box<dyn TextExtractor>,
        embedder: Box<dyn Embedder>,
        answer_extractor: Box<dyn AnswerExtractor>,
    ) -> Self {
        let classifier = ContainmentClassifier {
            header_prefix_len: config.chunking.header_prefix_len,
        };
        Self {
            config,
            classifier,
            text_extractor,
            embedder,
            answer_extractor,
        }
    }

    /// Extract and normalize one document from a file path.
    pub fn extract_document(&self, path: &Path) -> Result<Document, DocketError> {
        let extracted = self.text_extractor.extract(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Document {
            id: Uuid::new_v4().to_string(),
            filename,
            full_text: extracted.full_text,
            sections: extracted.sections,
        })
    }

    /// Chunk and embed one document, returning records ready to persist.
    ///
    /// An empty chunk sequence (empty document text) is returned as-is:
    /// "nothing to index" is recoverable, not an error.
    pub async fn ingest_document(&self, document: &Document) -> Result<Vec<Chunk>, DocketError> {
        let chunks = chunk_document(
            document,
            self.config.chunking.chunk_size,
            self.config.chunking.overlap_units,
            &self.classifier,
        );
        if chunks.is_empty() {
            info!(file = %document.filename, "document produced no chunks; nothing to index");
            return Ok(Vec::new());
        }
        let embedded = embedding::attach_embeddings(
            self.embedder.as_ref(),
            chunks,
            self.config.embedding.batch_size,
            self.config.embedding.max_concurrency,
        )
        .await?;
        info!(
            file = %document.filename,
            chunks = embedded.len(),
            "document chunked and embedded"
        );
        Ok(embedded)
    }

    /// Full ingest of one file: extract, chunk, embed.
    pub async fn ingest_file(&self, path: &Path) -> Result<(Document, Vec<Chunk>), DocketError> {
        let document = self.extract_document(path)?;
        let chunks = self.ingest_document(&document).await?;
        Ok((document, chunks))
    }

    /// Answer a question against an immutable corpus snapshot.
    ///
    /// Fails only when the query vector cannot be produced; every
    /// retrieval or extraction shortfall degrades to a well-typed
    /// result instead.
    pub async fn query(
        &self,
        question: &str,
        snapshot: &[Chunk],
        params: &QueryParams,
    ) -> Result<AnswerResult, DocketError> {
        let query_vec = embedding::embed_query(self.embedder.as_ref(), question).await?;
        let ranked = rank(snapshot, &query_vec, params.top_k, params.threshold);
        debug!(
            question,
            corpus = snapshot.len(),
            retrieved = ranked.len(),
            "ranked corpus against query"
        );

        if ranked.is_empty() {
            return Ok(synthesize(&ranked, Extraction::Failed));
        }

        let context = pack_context(&ranked, params.max_context_length);
        let extraction = extract_with_timeout(
            self.answer_extractor.as_ref(),
            question,
            &context,
            Duration::from_secs(self.config.qa.timeout_secs),
        )
        .await;

        Ok(synthesize(&ranked, extraction))
    }
}
