//! TOML configuration parsing.
//!
//! Defaults mirror the tuning the pipeline was developed with: 500-char
//! chunks, top-5 retrieval at a 0.3 similarity threshold, 2000-char QA
//! context, and 32-text embedding batches.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub qa: QaConfig,
}

impl Config {
    /// Load and parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Path of the JSON corpus file.
    pub corpus_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Trailing units carried over into the next chunk.
    #[serde(default = "default_overlap_units")]
    pub overlap_units: usize,
    #[serde(default = "default_header_prefix_len")]
    pub header_prefix_len: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap_units: default_overlap_units(),
            header_prefix_len: default_header_prefix_len(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}
fn default_overlap_units() -> usize {
    1
}
fn default_header_prefix_len() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            threshold: default_threshold(),
            max_context_length: default_max_context_length(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_threshold() -> f32 {
    0.3
}
fn default_max_context_length() -> usize {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"openai"`, `"ollama"`, or `"disabled"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Batches embedded concurrently during ingestion.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            endpoint: None,
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_max_concurrency() -> usize {
    4
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct QaConfig {
    /// `"http"` or `"disabled"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_max_answer_len")]
    pub max_answer_len: usize,
    #[serde(default = "default_allow_no_answer")]
    pub allow_no_answer: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            endpoint: None,
            max_answer_len: default_max_answer_len(),
            allow_no_answer: default_allow_no_answer(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_answer_len() -> usize {
    200
}
fn default_allow_no_answer() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[storage]
corpus_path = "data/corpus.json"
"#,
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.overlap_units, 1);
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.retrieval.threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.embedding.provider, "disabled");
        assert_eq!(config.qa.max_answer_len, 200);
        assert!(config.qa.allow_no_answer);
    }

    #[test]
    fn test_overrides_applied() {
        let config: Config = toml::from_str(
            r#"
[storage]
corpus_path = "corpus.json"

[chunking]
chunk_size = 800

[retrieval]
top_k = 3
threshold = 0.5

[embedding]
provider = "ollama"
model = "nomic-embed-text"
dims = 768
"#,
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.embedding.dims, Some(768));
    }
}
