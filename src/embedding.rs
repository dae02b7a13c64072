//! Embedder trait for generating vector embeddings from query text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that turns query text into an embedding vector.
///
/// Implementations wrap specific embedding backends behind a unified
/// async interface. The engine embeds one query variant at a time, so no
/// batch method is exposed; concurrency across variants happens at the
/// call site.
///
/// # Example
///
/// ```rust,ignore
/// use paperscope::Embedder;
///
/// let embedder = OpenAIEmbedder::from_env()?;
/// let embedding = embedder.embed("low-rank adaptation").await?;
/// assert_eq!(embedding.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
