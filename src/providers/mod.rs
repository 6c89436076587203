/*!
 * Client implementations for the remote translation service.
 *
 * The service contract is one request per cue:
 * `{ "text", "target_language" }` in, `{ "translation" }` out.
 * - `http`: reqwest client for the real endpoint
 * - `mock`: in-process provider with scripted behaviors
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Body sent for a single cue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Cue text to translate
    pub text: String,
    /// Target language name, e.g. "Spanish"
    pub target_language: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target_language: target_language.into(),
        }
    }
}

/// Body returned by the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    /// Translated text, absent when the service had nothing to offer
    #[serde(default)]
    pub translation: Option<String>,
}

impl TranslationResponse {
    pub fn translated(text: impl Into<String>) -> Self {
        Self {
            translation: Some(text.into()),
        }
    }

    /// Translated text, or `original` when the payload carries none
    pub fn text_or<'a>(&'a self, original: &'a str) -> &'a str {
        match self.translation.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => original,
        }
    }
}

/// Common trait for translation service clients
///
/// The batch pipeline only depends on this trait, so the HTTP client and the
/// mock can be used interchangeably.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate one cue
    ///
    /// # Returns
    /// * `Result<TranslationResponse, ProviderError>` - The decoded response or an error
    async fn complete(&self, request: TranslationRequest) -> Result<TranslationResponse, ProviderError>;
}

pub mod http;
pub mod mock;

pub use http::HttpProvider;
pub use mock::{MockBehavior, MockProvider};
