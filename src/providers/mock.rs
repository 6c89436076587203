/*!
 * Mock provider implementation for testing.
 *
 * This module provides a mock provider that simulates different service behaviors:
 * - `MockProvider::working()` - Always succeeds with a tagged translation
 * - `MockProvider::uppercase()` - Returns the text uppercased
 * - `MockProvider::missing_translation()` - Succeeds without a `translation` field
 * - `MockProvider::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{Provider, TranslationRequest, TranslationResponse};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `[TRANSLATED to <lang>] <text>`
    Working,
    /// Always succeeds with the text uppercased
    Uppercase,
    /// Succeeds with an empty payload
    MissingTranslation,
    /// Always fails with a 500
    Failing,
    /// Fails on the Nth request (1-based), succeeds otherwise
    FailOnRequest { request: usize },
    /// Fails whenever the cue text equals the given string
    FailOnText { text: String },
    /// Succeeds after sleeping (for stall and interleaving tests)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total requests received, shared across clones
    request_count: Arc<AtomicUsize>,
    /// Requests currently awaiting a response
    in_flight: Arc<AtomicUsize>,
    /// Highest number of simultaneous requests seen
    peak_in_flight: Arc<AtomicUsize>,
    /// Every request received, in arrival order
    requests: Arc<Mutex<Vec<TranslationRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn uppercase() -> Self {
        Self::new(MockBehavior::Uppercase)
    }

    pub fn missing_translation() -> Self {
        Self::new(MockBehavior::MissingTranslation)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn fail_on_request(request: usize) -> Self {
        Self::new(MockBehavior::FailOnRequest { request })
    }

    pub fn fail_on_text(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailOnText { text: text.into() })
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were in flight at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Snapshot of the requests received so far
    pub fn requests(&self) -> Vec<TranslationRequest> {
        self.requests.lock().clone()
    }

    fn simulated_failure(count: usize) -> ProviderError {
        ProviderError::ApiError {
            status_code: 500,
            message: format!("Simulated provider failure (request #{})", count),
        }
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: TranslationRequest) -> Result<TranslationResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        // Yield once so concurrent calls in a batch overlap
        tokio::task::yield_now().await;

        match &self.behavior {
            MockBehavior::Working => Ok(TranslationResponse::translated(format!(
                "[TRANSLATED to {}] {}",
                request.target_language, request.text
            ))),

            MockBehavior::Uppercase => Ok(TranslationResponse::translated(request.text.to_uppercase())),

            MockBehavior::MissingTranslation => Ok(TranslationResponse::default()),

            MockBehavior::Failing => Err(Self::simulated_failure(count)),

            MockBehavior::FailOnRequest { request: fail_at } => {
                if count == *fail_at {
                    Err(Self::simulated_failure(count))
                } else {
                    Ok(TranslationResponse::translated(request.text.to_uppercase()))
                }
            }

            MockBehavior::FailOnText { text } => {
                if &request.text == text {
                    Err(Self::simulated_failure(count))
                } else {
                    Ok(TranslationResponse::translated(request.text.to_uppercase()))
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(TranslationResponse::translated(request.text.to_uppercase()))
            }
        }
    }
}
