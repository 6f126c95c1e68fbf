//! Embedding provider contract (spec §4.R): request/response shape only.
//! Wiring a real HTTP client for `openai`/`local` is out of scope — those
//! variants exist so configuration can name them, and resolve to stubs that
//! report `UnsupportedFeature` until a real client is plugged in.

use kgraph_core::config::EmbeddingProviderKind;
use kgraph_core::{Error, Result};
use std::time::Duration;

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts into fixed-dimension vectors. Implementations
    /// that refuse an oversized batch should return `Error::EmbeddingFailed`
    /// with a message the caller can use to halve and retry (see
    /// [`embed_with_fallback`]).
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimensions(&self) -> usize;

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}

/// Always refuses: the default provider when no embedding backend is
/// configured (`EmbeddingProviderKind::None`).
pub struct NoneProvider {
    dimensions: usize,
}

impl NoneProvider {
    pub fn new(dimensions: usize) -> Self {
        NoneProvider { dimensions }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for NoneProvider {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::UnsupportedFeature { what: "embeddings (provider: none)".to_string() })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Deterministic hash-based embedding for tests and the `mock` config
/// value: stable across calls, cheap, and dimension-correct, but carries no
/// actual semantic information.
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        MockProvider { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for (i, byte) in text.bytes().enumerate() {
            let slot = i % self.dimensions;
            vector[slot] += (byte as f32) / 255.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Stub for a provider kind recognised by configuration but not yet wired to
/// a real client (`openai`, `local`). Always reports `UnsupportedFeature`.
pub struct StubProvider {
    name: &'static str,
    dimensions: usize,
}

impl StubProvider {
    pub fn openai(dimensions: usize) -> Self {
        StubProvider { name: "openai", dimensions }
    }

    pub fn local(dimensions: usize) -> Self {
        StubProvider { name: "local", dimensions }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for StubProvider {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::UnsupportedFeature { what: format!("embeddings (provider: {})", self.name) })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Resolves the configured provider kind into a concrete implementation.
pub fn provider_for(kind: EmbeddingProviderKind, dimensions: usize) -> Box<dyn EmbeddingProvider> {
    match kind {
        EmbeddingProviderKind::None => Box::new(NoneProvider::new(dimensions)),
        EmbeddingProviderKind::Mock => Box::new(MockProvider::new(dimensions)),
        EmbeddingProviderKind::Openai => Box::new(StubProvider::openai(dimensions)),
        EmbeddingProviderKind::Local => Box::new(StubProvider::local(dimensions)),
    }
}

/// Embeds `texts` through `provider`, and on an "batch too large" refusal
/// (detected heuristically from the error message, since the contract does
/// not standardise a distinct error code for it) retries once with the
/// batch split in half and the halves concatenated back together in order.
pub async fn embed_with_fallback(provider: &dyn EmbeddingProvider, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    match provider.embed(texts).await {
        Ok(vectors) => Ok(vectors),
        Err(err) if texts.len() > 1 && looks_like_batch_too_large(&err) => {
            let mid = texts.len() / 2;
            let (first_half, second_half) = texts.split_at(mid);
            let mut first = Box::pin(embed_with_fallback(provider, first_half)).await?;
            let second = Box::pin(embed_with_fallback(provider, second_half)).await?;
            first.extend(second);
            Ok(first)
        }
        Err(err) => Err(err),
    }
}

fn looks_like_batch_too_large(err: &Error) -> bool {
    matches!(err, Error::EmbeddingFailed { message } if message.to_lowercase().contains("batch too large") || message.to_lowercase().contains("too many"))
}
