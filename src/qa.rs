//! Extractive-QA provider abstraction and implementations.
//!
//! Defines the [`AnswerExtractor`] trait plus:
//! - **[`HttpExtractor`]** — posts `(question, context)` to a hosted
//!   question-answering endpoint and parses `{answer, score}`.
//! - **[`DisabledExtractor`]** — always reports failure; queries then
//!   run entirely on the deterministic fallback.
//!
//! [`extract_with_timeout`] is the only way the pipeline invokes the
//! capability. Transport errors, non-2xx responses, malformed bodies,
//! empty answers, and timeouts all collapse into
//! [`Extraction::Failed`]; the query caller never sees an error from
//! this layer.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use docket_core::answer::Extraction;

use crate::config::QaConfig;

/// An extractive-QA capability: selects a literal span from context.
#[async_trait]
pub trait AnswerExtractor: Send + Sync {
    /// Extract an answer span for `question` from `context`.
    ///
    /// Returns `Extraction::Failed` for a declared no-answer; transport
    /// and provider errors surface as `Err` and are normalized by
    /// [`extract_with_timeout`].
    async fn extract_answer(&self, question: &str, context: &str) -> Result<Extraction>;
}

/// Instantiate the extractor named by the configuration.
pub fn create_extractor(config: &QaConfig) -> Result<Box<dyn AnswerExtractor>> {
    match config.provider.as_str() {
        "http" => Ok(Box::new(HttpExtractor::new(config)?)),
        "disabled" => Ok(Box::new(DisabledExtractor)),
        other => bail!("Unknown QA provider: {}", other),
    }
}

/// Run the capability under a deadline, normalizing every failure mode.
///
/// A timeout is treated identically to an extraction error: both yield
/// `Extraction::Failed` and hand control to the synthesis fallback. The
/// call is never left as an unhandled suspension.
pub async fn extract_with_timeout(
    extractor: &dyn AnswerExtractor,
    question: &str,
    context: &str,
    timeout: Duration,
) -> Extraction {
    match tokio::time::timeout(timeout, extractor.extract_answer(question, context)).await {
        Ok(Ok(extraction)) => extraction,
        Ok(Err(e)) => {
            warn!(error = %format!("{:#}", e), "answer extraction failed; using fallback");
            Extraction::Failed
        }
        Err(_) => {
            warn!(timeout_secs = timeout.as_secs(), "answer extraction timed out; using fallback");
            Extraction::Failed
        }
    }
}

/// A no-op extractor that always reports failure.
pub struct DisabledExtractor;

#[async_trait]
impl AnswerExtractor for DisabledExtractor {
    async fn extract_answer(&self, _question: &str, _context: &str) -> Result<Extraction> {
        Ok(Extraction::Failed)
    }
}

/// Extractor calling a hosted QA model over HTTP.
///
/// Sends `POST {endpoint}` with an inference-API-style body:
/// `{"inputs": {"question", "context"}, "parameters": {...}}` and
/// expects `{"answer": string, "score": float}` back.
pub struct HttpExtractor {
    endpoint: String,
    max_answer_len: usize,
    allow_no_answer: bool,
    client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new(config: &QaConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("qa.endpoint required for HTTP provider"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint,
            max_answer_len: config.max_answer_len,
            allow_no_answer: config.allow_no_answer,
            client,
        })
    }
}

#[async_trait]
impl AnswerExtractor for HttpExtractor {
    async fn extract_answer(&self, question: &str, context: &str) -> Result<Extraction> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "inputs": { "question": question, "context": context },
                "parameters": {
                    "max_answer_len": self.max_answer_len,
                    "handle_impossible_answer": self.allow_no_answer,
                },
            }))
            .send()
            .await
            .context("QA request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("QA API returned {}: {}", status, body);
        }

        #[derive(serde::Deserialize)]
        struct ApiResponse {
            answer: String,
            score: f32,
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .context("Failed to parse QA response")?;

        // Models configured to handle impossible answers signal "no
        // answer" with an empty span.
        if parsed.answer.trim().is_empty() {
            return Ok(Extraction::Failed);
        }

        Ok(Extraction::Answered {
            answer: parsed.answer,
            score: parsed.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowExtractor;

    #[async_trait]
    impl AnswerExtractor for SlowExtractor {
        async fn extract_answer(&self, _q: &str, _c: &str) -> Result<Extraction> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Extraction::Answered {
                answer: "too late".to_string(),
                score: 0.9,
            })
        }
    }

    struct ErringExtractor;

    #[async_trait]
    impl AnswerExtractor for ErringExtractor {
        async fn extract_answer(&self, _q: &str, _c: &str) -> Result<Extraction> {
            bail!("model crashed")
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure() {
        let result = extract_with_timeout(
            &SlowExtractor,
            "what was held?",
            "context",
            Duration::from_millis(50),
        )
        .await;
        assert_eq!(result, Extraction::Failed);
    }

    #[tokio::test]
    async fn test_error_becomes_failure() {
        let result = extract_with_timeout(
            &ErringExtractor,
            "what was held?",
            "context",
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(result, Extraction::Failed);
    }

    #[tokio::test]
    async fn test_disabled_extractor_reports_failure() {
        let result = DisabledExtractor
            .extract_answer("q", "c")
            .await
            .unwrap();
        assert_eq!(result, Extraction::Failed);
    }
}
