//! # Docket CLI
//!
//! The `docket` binary drives the QA pipeline from the command line.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docket ingest <files…>` | Extract, chunk, and embed case files into the corpus |
//! | `docket query "<question>"` | Answer a question against the corpus |
//! | `docket stats` | Show corpus size and embedding dimension |
//!
//! ## Examples
//!
//! ```bash
//! # Ingest a directory of decisions
//! docket ingest cases/*.txt --config ./docket.toml
//!
//! # Ask a question
//! docket query "What penalty did the court impose?" --config ./docket.toml
//!
//! # Tighten retrieval for a precise question
//! docket query "When was the information filed?" --top-k 3 --threshold 0.5
//! ```

mod config;
mod embedding;
mod extract;
mod pipeline;
mod qa;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docket_core::models::AnswerKind;

use crate::config::Config;
use crate::extract::PlainTextExtractor;
use crate::pipeline::{Pipeline, QueryParams};
use crate::store::{content_hash, CorpusStore, DocumentEntry};

/// Docket — retrieval-augmented question answering over legal documents.
#[derive(Parser)]
#[command(name = "docket", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "docket.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest case files into the corpus.
    Ingest {
        /// Plain-text case files to ingest.
        files: Vec<PathBuf>,
        /// Re-ingest files even when their content is unchanged.
        #[arg(long)]
        force: bool,
    },
    /// Answer a question against the ingested corpus.
    Query {
        /// The question to answer.
        question: String,
        /// Maximum passages to retrieve.
        #[arg(long)]
        top_k: Option<usize>,
        /// Minimum similarity for a passage to qualify.
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Show corpus statistics.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Ingest { files, force } => cmd_ingest(&config, &files, force).await,
        Commands::Query {
            question,
            top_k,
            threshold,
        } => cmd_query(&config, &question, top_k, threshold).await,
        Commands::Stats => cmd_stats(&config),
    }
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let embedder = embedding::create_embedder(&config.embedding)?;
    let extractor = qa::create_extractor(&config.qa)?;
    Ok(Pipeline::new(
        config.clone(),
        Box::new(PlainTextExtractor),
        embedder,
        extractor,
    ))
}

async fn cmd_ingest(config: &Config, files: &[PathBuf], force: bool) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let store = CorpusStore::new(&config.storage.corpus_path);
    let mut corpus = store.load()?;

    let mut ingested = 0usize;
    let mut skipped = 0usize;
    let mut chunks_written = 0usize;

    for path in files {
        let document = pipeline.extract_document(path)?;
        let hash = content_hash(&document.full_text);
        if !force && corpus.is_current(&document.filename, &hash) {
            println!("  {} unchanged, skipped", document.filename);
            skipped += 1;
            continue;
        }

        let chunks = pipeline.ingest_document(&document).await?;
        println!("  {}: {} chunks", document.filename, chunks.len());
        chunks_written += chunks.len();
        corpus.upsert(DocumentEntry {
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            content_hash: hash,
            ingested_at: chrono::Utc::now(),
            chunks,
        });
        ingested += 1;
    }

    store.save(&corpus)?;

    println!("ingest");
    println!("  documents ingested: {}", ingested);
    println!("  documents skipped: {}", skipped);
    println!("  chunks written: {}", chunks_written);
    println!("ok");
    Ok(())
}

async fn cmd_query(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    threshold: Option<f32>,
) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let store = CorpusStore::new(&config.storage.corpus_path);
    let snapshot = store.load()?.all_chunks();

    let mut params = QueryParams::from(config);
    if let Some(k) = top_k {
        params.top_k = k;
    }
    if let Some(t) = threshold {
        params.threshold = t;
    }

    let result = pipeline.query(question, &snapshot, &params).await?;

    println!("Q: {}", question);
    println!("A: {}", result.answer);
    if let Some(confidence) = result.confidence {
        println!("confidence: {:.2}", confidence);
    }
    if let Some(source) = &result.source {
        println!("source: {}", source);
    }
    if result.kind == AnswerKind::Fallback {
        println!("(extraction unavailable; showing the most relevant passage)");
    }
    if !result.citations.is_empty() {
        println!("relevant passages:");
        for citation in &result.citations {
            println!("  - {} (similarity {:.2})", citation.source, citation.similarity);
        }
    }
    Ok(())
}

fn cmd_stats(config: &Config) -> Result<()> {
    let store = CorpusStore::new(&config.storage.corpus_path);
    let corpus = store.load()?;
    let chunks = corpus.all_chunks();
    let dims = chunks
        .iter()
        .find_map(|c| c.embedding.as_ref().map(Vec::len));

    println!("corpus: {}", store.path().display());
    println!("  documents: {}", corpus.documents.len());
    println!("  chunks: {}", chunks.len());
    match dims {
        Some(d) => println!("  embedding dims: {}", d),
        None => println!("  embedding dims: (no embeddings)"),
    }
    println!("ok");
    Ok(())
}
