//! Vector index trait for semantic candidate lookup.

use async_trait::async_trait;

use crate::error::Result;
use crate::paper::SemanticHit;

/// The distance metric a vector index backend is configured with.
///
/// The engine's similarity math assumes [`Cosine`](DistanceMetric::Cosine);
/// deployments can check the backend's actual configuration through
/// [`VectorIndex::distance_metric`] before going live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Cosine distance, `1 - cosine_similarity`, in `[0, 2]`.
    Cosine,
    /// Euclidean (L2) distance.
    Euclidean,
    /// Negated dot product.
    Dot,
    /// Manhattan (L1) distance.
    Manhattan,
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Dot => "dot",
            DistanceMetric::Manhattan => "manhattan",
        };
        f.write_str(name)
    }
}

/// A read-only index of paper embeddings with nearest-neighbor search.
///
/// An index holds one point per paper or one point per text chunk; which
/// granularity is in use is an ingestion-time decision and must be
/// consistent across the whole index. Each point carries the id of the
/// paper it belongs to, so chunk hits already arrive resolved to papers.
///
/// # Example
///
/// ```rust,ignore
/// use paperscope::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// index.add_paper(42, embedding).await;
/// let hits = index.search(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `top_k` nearest points to the given embedding.
    ///
    /// Hits are ordered by ascending distance (closest first) and are not
    /// thresholded; the engine applies its distance cutoff afterwards.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SemanticHit>>;

    /// Report the distance metric this index is configured with.
    async fn distance_metric(&self) -> Result<DistanceMetric>;
}
