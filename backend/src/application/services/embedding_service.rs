/// Bounded-retry wrapper around an external embedding provider
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::value_objects::EmbeddingVector;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    /// Timeouts, rate limiting, server-side failures
    #[error("Transient embedding failure: {0}")]
    Transient(String),

    /// Authentication or configuration problems; never retried
    #[error("Embedding request rejected: {0}")]
    Terminal(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Error generating embedding after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl EmbeddingError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingError::Transient(_))
    }
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// A single call to an embedding service
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> EmbeddingResult<EmbeddingVector>;
}

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Decide the next step after attempt number `attempt` (1-based) failed with `error`
    pub fn decide(&self, attempt: u32, error: &EmbeddingError) -> RetryDecision {
        if error.is_transient() && attempt < self.max_attempts {
            RetryDecision::RetryAfter(self.delay)
        } else {
            RetryDecision::GiveUp
        }
    }
}

/// Progress event for an embedding request
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingProgressEvent {
    AttemptFailed {
        attempt: u32,
        retry_in: Duration,
        error: String,
    },
    Failed {
        attempts: u32,
        error: String,
    },
}

/// Callback type for embedding progress events
pub type EmbeddingProgressCallback = Arc<dyn Fn(EmbeddingProgressEvent) + Send + Sync>;

/// Turns text into an embedding, retrying transient provider failures
pub struct EmbeddingRequester<P: EmbeddingProvider> {
    provider: P,
    policy: RetryPolicy,
    progress_callback: Option<EmbeddingProgressCallback>,
}

impl<P: EmbeddingProvider> EmbeddingRequester<P> {
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        EmbeddingRequester {
            provider,
            policy,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: EmbeddingProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Generate an embedding for `text`
    pub async fn embed_text(&self, text: &str) -> EmbeddingResult<EmbeddingVector> {
        debug!("Generating embedding for text (length: {})", text.len());

        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.provider.embed(text).await {
                Ok(embedding) => {
                    debug!(
                        "Embedding generated on attempt {} ({} dimensions)",
                        attempt,
                        embedding.dimension_count()
                    );
                    return Ok(embedding);
                }
                Err(error) => error,
            };

            match self.policy.decide(attempt, &error) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        "Embedding attempt {} failed: {}. Retrying in {:?}",
                        attempt, error, delay
                    );
                    self.emit(EmbeddingProgressEvent::AttemptFailed {
                        attempt,
                        retry_in: delay,
                        error: error.to_string(),
                    });
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    let error = if error.is_transient() {
                        EmbeddingError::Exhausted {
                            attempts: attempt,
                            last_error: error.to_string(),
                        }
                    } else {
                        error
                    };
                    warn!("Embedding failed after {} attempt(s): {}", attempt, error);
                    self.emit(EmbeddingProgressEvent::Failed {
                        attempts: attempt,
                        error: error.to_string(),
                    });
                    return Err(error);
                }
            }
        }
    }

    fn emit(&self, event: EmbeddingProgressEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }
}
