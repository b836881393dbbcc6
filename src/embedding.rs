//! Embedding provider abstraction and implementations.
//!
//! Defines the [`Embedder`] trait and concrete implementations:
//! - **[`OpenAiEmbedder`]** — calls the OpenAI embeddings API.
//! - **[`OllamaEmbedder`]** — calls a local Ollama instance's `/api/embed` endpoint.
//! - **[`DisabledEmbedder`]** — returns errors; used when embeddings are not configured.
//!
//! Providers are injected into the pipeline at construction time so
//! tests can substitute deterministic stand-ins; nothing here is a
//! global singleton.
//!
//! [`embed_in_batches`] is the main entry point during ingestion: it
//! slices the input into fixed-size batches (default 32) and runs a
//! bounded number of them concurrently. Batching bounds peak request
//! size only — results are reassembled in input order, so batch
//! boundaries are invisible to callers.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use docket_core::models::Chunk;
use docket_core::DocketError;

use crate::config::EmbeddingConfig;

/// An embedding capability: ordered texts in, ordered vectors out.
///
/// Implementations must be deterministic for a fixed model version and
/// must return one vector per input text, in input order, all of the
/// same dimension.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Vector dimensionality, or `0` when unknown until the first call.
    fn dims(&self) -> usize;
    /// Embed one batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Instantiate the embedder named by the configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiEmbedder::new(config)?)),
        "ollama" => Ok(Box::new(OllamaEmbedder::new(config)?)),
        "disabled" => Ok(Box::new(DisabledEmbedder)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

/// Embed texts in order-preserving batches with bounded concurrency.
///
/// Returns exactly one vector per input text, in input order. Any
/// provider failure, count mismatch, or dimension inconsistency is an
/// [`DocketError::Embedding`] — a corpus must never be committed with
/// missing or malformed vectors.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    max_concurrency: usize,
) -> std::result::Result<Vec<Vec<f32>>, DocketError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let batch_size = batch_size.max(1);
    let batches: Vec<Vec<String>> = texts.chunks(batch_size).map(|b| b.to_vec()).collect();
    let batch_count = batches.len();

    // `buffered` polls up to `max_concurrency` batches at once but
    // yields results in submission order.
    let results: Vec<Vec<Vec<f32>>> = stream::iter(batches)
        .map(|batch| async move { embedder.embed_batch(&batch).await })
        .buffered(max_concurrency.max(1))
        .try_collect()
        .await
        .map_err(|e| DocketError::Embedding(format!("{:#}", e)))?;

    let vectors: Vec<Vec<f32>> = results.into_iter().flatten().collect();
    if vectors.len() != texts.len() {
        return Err(DocketError::Embedding(format!(
            "provider returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }
    let dims = vectors[0].len();
    if dims == 0 || vectors.iter().any(|v| v.len() != dims) {
        return Err(DocketError::Embedding(
            "provider returned vectors of inconsistent dimension".to_string(),
        ));
    }

    debug!(texts = texts.len(), batches = batch_count, dims, "embedded texts");
    Ok(vectors)
}

/// Attach vectors to chunks, preserving order and count.
///
/// This is the single embedding-assignment step in a chunk's life;
/// chunks are never otherwise mutated after creation.
pub async fn attach_embeddings(
    embedder: &dyn Embedder,
    mut chunks: Vec<Chunk>,
    batch_size: usize,
    max_concurrency: usize,
) -> std::result::Result<Vec<Chunk>, DocketError> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embed_in_batches(embedder, &texts, batch_size, max_concurrency).await?;
    for (chunk, vector) in chunks.iter_mut().zip(vectors) {
        chunk.embedding = Some(vector);
    }
    Ok(chunks)
}

/// Embed a single query text.
pub async fn embed_query(
    embedder: &dyn Embedder,
    text: &str,
) -> std::result::Result<Vec<f32>, DocketError> {
    let mut vectors = embed_in_batches(embedder, &[text.to_string()], 1, 1).await?;
    Ok(vectors.remove(0))
}

// ============ Disabled Provider ============

/// A no-op embedder that always returns errors.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("Embedding provider is disabled")
    }
}

// ============ OpenAI Provider ============

/// Embedder using the OpenAI embeddings API.
///
/// Calls `POST /v1/embeddings` with the configured model. Requires the
/// `OPENAI_API_KEY` environment variable.
pub struct OpenAiEmbedder {
    model: String,
    dims: usize,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/embeddings".to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model,
            dims,
            endpoint,
            client,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set in environment")?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .context("OpenAI embeddings request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("OpenAI embeddings API returned {}: {}", status, body);
        }

        #[derive(serde::Deserialize)]
        struct ApiResponse {
            data: Vec<ApiEmbedding>,
        }
        #[derive(serde::Deserialize)]
        struct ApiEmbedding {
            embedding: Vec<f32>,
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI embeddings response")?;
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

// ============ Ollama Provider ============

/// Embedder using a local Ollama instance's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    model: String,
    dims: usize,
    endpoint: String,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for Ollama provider"))?;
        let base = config
            .endpoint
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            model,
            dims: config.dims.unwrap_or(0),
            endpoint: format!("{}/api/embed", base.trim_end_matches('/')),
            client,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .context("Ollama embed request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Ollama embed API returned {}: {}", status, body);
        }

        #[derive(serde::Deserialize)]
        struct ApiResponse {
            embeddings: Vec<Vec<f32>>,
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .context("Failed to parse Ollama embed response")?;
        Ok(parsed.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docket_core::models::SectionType;

    /// Deterministic embedder: vector encodes text length and batch
    /// call count is observable through an atomic counter.
    struct CountingEmbedder {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_name(&self) -> &str {
            "counting"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| vec![t.chars().count() as f32, 1.0])
                .collect())
        }
    }

    struct LopsidedEmbedder;

    #[async_trait]
    impl Embedder for LopsidedEmbedder {
        fn model_name(&self) -> &str {
            "lopsided"
        }
        fn dims(&self) -> usize {
            0
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            // Varies dimension with text length: invalid by contract.
            Ok(texts.iter().map(|t| vec![0.5; t.len() % 3 + 1]).collect())
        }
    }

    #[tokio::test]
    async fn test_batching_preserves_order_and_count() {
        let embedder = CountingEmbedder {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let texts: Vec<String> = (0..10).map(|i| "x".repeat(i + 1)).collect();
        let vectors = embed_in_batches(&embedder, &texts, 3, 2).await.unwrap();
        assert_eq!(vectors.len(), 10);
        for (i, v) in vectors.iter().enumerate() {
            assert_eq!(v[0], (i + 1) as f32, "order not preserved at {}", i);
        }
        assert_eq!(embedder.calls.load(std::sync::atomic::Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_input_no_calls() {
        let embedder = CountingEmbedder {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let vectors = embed_in_batches(&embedder, &[], 32, 4).await.unwrap();
        assert!(vectors.is_empty());
        assert_eq!(embedder.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inconsistent_dims_rejected() {
        let texts: Vec<String> = vec!["a".into(), "ab".into(), "abc".into()];
        let err = embed_in_batches(&LopsidedEmbedder, &texts, 32, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DocketError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_disabled_provider_fails() {
        let err = embed_query(&DisabledEmbedder, "question").await.unwrap_err();
        assert!(matches!(err, DocketError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_attach_embeddings_keeps_chunk_order() {
        let embedder = CountingEmbedder {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let chunks: Vec<Chunk> = (0..4)
            .map(|i| {
                Chunk::new(
                    "case.txt",
                    i,
                    "y".repeat(i + 1),
                    SectionType::Decision,
                )
            })
            .collect();
        let embedded = attach_embeddings(&embedder, chunks, 2, 2).await.unwrap();
        assert_eq!(embedded.len(), 4);
        for (i, c) in embedded.iter().enumerate() {
            assert_eq!(c.id, format!("case.txt-chunk-{}", i));
            assert_eq!(c.embedding.as_ref().unwrap()[0], (i + 1) as f32);
        }
    }
}
