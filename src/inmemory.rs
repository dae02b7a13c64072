//! In-memory vector index using cosine distance.
//!
//! This module provides [`InMemoryVectorIndex`], a zero-dependency index
//! backed by a `Vec` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small libraries.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::paper::{PaperId, SemanticHit};
use crate::vector::{DistanceMetric, VectorIndex};

#[derive(Debug)]
struct StoredPoint {
    paper_id: PaperId,
    embedding: Vec<f32>,
    source_text: Option<String>,
}

/// An in-memory [`VectorIndex`] using cosine distance.
///
/// Points are appended via [`add_paper`](InMemoryVectorIndex::add_paper)
/// (one point per paper) or [`add_chunk`](InMemoryVectorIndex::add_chunk)
/// (one point per text chunk); pick one granularity per index and stick
/// with it. All operations are async-safe via `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use paperscope::{InMemoryVectorIndex, VectorIndex};
///
/// let index = InMemoryVectorIndex::new();
/// index.add_chunk(42, embedding, "the chunk text").await;
/// let hits = index.search(&query_embedding, 5).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    points: RwLock<Vec<StoredPoint>>,
}

impl InMemoryVectorIndex {
    /// Create a new empty in-memory vector index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a paper-granularity point. Adding the same paper twice appends
    /// a second point rather than replacing the first.
    pub async fn add_paper(&self, paper_id: PaperId, embedding: Vec<f32>) {
        let mut points = self.points.write().await;
        points.push(StoredPoint { paper_id, embedding, source_text: None });
    }

    /// Add a chunk-granularity point carrying the indexed text.
    pub async fn add_chunk(
        &self,
        paper_id: PaperId,
        embedding: Vec<f32>,
        source_text: impl Into<String>,
    ) {
        let mut points = self.points.write().await;
        points.push(StoredPoint { paper_id, embedding, source_text: Some(source_text.into()) });
    }
}

/// Compute cosine similarity between two vectors.
///
/// Both vectors are L2-normalized before computing the dot product.
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SemanticHit>> {
        let points = self.points.read().await;

        let mut hits: Vec<SemanticHit> = points
            .iter()
            .map(|point| SemanticHit {
                paper_id: point.paper_id,
                distance: 1.0 - cosine_similarity(&point.embedding, embedding),
                source_text: point.source_text.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance.total_cmp(&b.distance).then_with(|| a.paper_id.cmp(&b.paper_id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn distance_metric(&self) -> Result<DistanceMetric> {
        Ok(DistanceMetric::Cosine)
    }
}
