//! Qdrant vector index backend.
//!
//! Provides [`QdrantVectorIndex`] which implements [`VectorIndex`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//! Only available when the `qdrant` feature is enabled.
//!
//! The collection is written by the ingestion pipeline; this backend only
//! searches it. Each point's payload is expected to carry an integer
//! `paper_id` and, for chunk-granularity collections, a `text` field.
//!
//! # Example
//!
//! ```rust,ignore
//! use paperscope::qdrant::QdrantVectorIndex;
//!
//! let index = QdrantVectorIndex::new("http://localhost:6334", "papers")?;
//! let hits = index.search(&query_embedding, 5).await?;
//! ```

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{Distance, SearchPointsBuilder, Value as QdrantValue};
use tracing::{debug, warn};

use crate::error::{Result, SearchError};
use crate::paper::SemanticHit;
use crate::vector::{DistanceMetric, VectorIndex};

/// A [`VectorIndex`] backed by a [Qdrant](https://qdrant.tech/) collection.
///
/// Qdrant reports cosine similarity scores; hits are converted to cosine
/// distance as `1 - score` so all backends speak the same unit.
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantVectorIndex {
    /// Create a new index over `collection`, connecting to the given URL.
    pub fn new(url: &str, collection: impl Into<String>) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client, collection: collection.into() })
    }

    /// Create a new index over `collection` at the default URL
    /// (`http://localhost:6334`).
    pub fn default_url(collection: impl Into<String>) -> Result<Self> {
        Self::new("http://localhost:6334", collection)
    }

    /// Create a new index over `collection` from an existing client.
    pub fn from_client(client: Qdrant, collection: impl Into<String>) -> Self {
        Self { client, collection: collection.into() }
    }

    fn map_err(e: qdrant_client::QdrantError) -> SearchError {
        SearchError::VectorIndexError { backend: "qdrant".to_string(), message: e.to_string() }
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Extract an integer from a Qdrant payload value, accepting numeric
    /// strings from ingestion pipelines that stringify ids.
    fn extract_integer(value: &QdrantValue) -> Option<i64> {
        match &value.kind {
            Some(Kind::IntegerValue(i)) => Some(*i),
            Some(Kind::StringValue(s)) => s.parse().ok(),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SemanticHit>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let mut hits = Vec::with_capacity(response.result.len());
        for scored in response.result {
            let Some(paper_id) = scored.payload.get("paper_id").and_then(Self::extract_integer)
            else {
                warn!(
                    collection = %self.collection,
                    "point has no integer paper_id payload, skipping"
                );
                continue;
            };
            let source_text = scored.payload.get("text").and_then(Self::extract_string);
            hits.push(SemanticHit { paper_id, distance: 1.0 - scored.score, source_text });
        }

        debug!(collection = %self.collection, count = hits.len(), "qdrant search completed");
        Ok(hits)
    }

    async fn distance_metric(&self) -> Result<DistanceMetric> {
        let info = self
            .client
            .collection_info(self.collection.as_str())
            .await
            .map_err(Self::map_err)?;

        let config = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        let Some(VectorsConfigKind::Params(params)) = config else {
            return Err(SearchError::VectorIndexError {
                backend: "qdrant".to_string(),
                message: format!(
                    "collection '{}' reports no single-vector params",
                    self.collection
                ),
            });
        };

        match Distance::try_from(params.distance) {
            Ok(Distance::Cosine) => Ok(DistanceMetric::Cosine),
            Ok(Distance::Euclid) => Ok(DistanceMetric::Euclidean),
            Ok(Distance::Dot) => Ok(DistanceMetric::Dot),
            Ok(Distance::Manhattan) => Ok(DistanceMetric::Manhattan),
            _ => Err(SearchError::VectorIndexError {
                backend: "qdrant".to_string(),
                message: format!(
                    "collection '{}' has an unrecognized distance metric",
                    self.collection
                ),
            }),
        }
    }
}
