//! # Docket Core
//!
//! Pure logic for Docket: data models, document chunking, similarity
//! ranking, answer synthesis, and the pipeline error taxonomy.
//!
//! This crate performs no I/O and holds no state across calls. The
//! embedding and extractive-QA models are opaque capabilities owned by
//! the application crate; this crate only defines the values that flow
//! into and out of them. Parallelism is limited to read-only `rayon`
//! passes, so no locks are needed anywhere in the crate.

pub mod answer;
pub mod chunk;
pub mod error;
pub mod models;
pub mod rank;

pub use error::{DocketError, Result};
