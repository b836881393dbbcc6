//! # Docket
//!
//! Retrieval-augmented question answering over segmented legal
//! documents. Docket ingests case files, splits them into bounded
//! overlapping passages tagged by document section, embeds the passages
//! as vectors, and answers questions by ranking passages against the
//! query and extracting a literal answer span — with a deterministic
//! fallback chain when extraction is unavailable or fails.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────┐   ┌─────────────┐
//! │ Case file │──▶│ Extract → Chunk  │──▶│ JSON corpus  │
//! │  (.txt)   │   │     → Embed      │   │ (snapshots)  │
//! └───────────┘   └──────────────────┘   └──────┬──────┘
//!                                               │
//!                 ┌──────────────────┐          ▼
//!   question ────▶│ Embed → Rank     │──▶ AnswerResult
//!                 │ → Extract/Fallback│   (+ citations)
//!                 └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | Text-extraction collaborator and section heuristics |
//! | [`embedding`] | Embedding provider abstraction (OpenAI, Ollama) |
//! | [`qa`] | Extractive-QA provider abstraction with deadlines |
//! | [`store`] | JSON corpus persistence and atomic snapshots |
//! | [`pipeline`] | Ingest and query orchestration |
//!
//! The pure algorithms (chunker, similarity ranking, answer synthesis)
//! live in the `docket-core` crate.

pub mod config;
pub mod embedding;
pub mod extract;
pub mod pipeline;
pub mod qa;
pub mod store;
