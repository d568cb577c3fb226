//! Boundary to the text generation service

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::ServiceError;

pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Per-call generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub model: String,
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }
}

/// Produces narrative text for a fully formed prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, options: &GenerateOptions)
        -> Result<String, ServiceError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ServiceError> {
        (**self).generate(prompt, options).await
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ServiceError> {
        (**self).generate(prompt, options).await
    }
}

/// Bounds every call of the wrapped generator
///
/// An elapsed deadline becomes [`ServiceError::Timeout`]; the in-flight
/// request is dropped.
#[derive(Debug, Clone)]
pub struct WithTimeout<G> {
    inner: G,
    timeout: Duration,
}

impl<G> WithTimeout<G> {
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for WithTimeout<G> {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String, ServiceError> {
        match tokio::time::timeout(self.timeout, self.inner.generate(prompt, options)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Generation call timed out");
                Err(ServiceError::Timeout(self.timeout))
            }
        }
    }
}
