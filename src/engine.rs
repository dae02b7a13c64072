//! Hybrid search orchestrator.
//!
//! The [`SearchEngine`] coordinates one search end to end: expand the
//! query, run keyword and semantic lookups for every variant in
//! parallel, fuse the rankings, and materialize the winning papers.
//!
//! Failure handling is asymmetric on purpose. The relational paper store
//! is the single source of truth, so its errors are fatal. The expansion
//! and semantic channels are additive signals: when either fails or
//! times out, the search continues without it and the outcome says so.
//!
//! # Example
//!
//! ```rust,ignore
//! use paperscope::{SearchEngine, SearchConfig, PaperStore, InMemoryVectorIndex};
//!
//! let engine = SearchEngine::builder()
//!     .config(SearchConfig::default())
//!     .store(PaperStore::connect("sqlite:papers.db").await?)
//!     .vector_index(Arc::new(index))
//!     .embedder(Arc::new(embedder))
//!     .expander(Arc::new(expander))  // optional
//!     .build()?;
//!
//! let outcome = engine.search("transformer architecture").await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use futures::future::{join, join_all, try_join_all};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::SearchConfig;
use crate::embedding::Embedder;
use crate::error::{Result, SearchError};
use crate::expansion::QueryExpander;
use crate::fusion::{FusionParams, reciprocal_rank_fusion};
use crate::paper::{PaperId, RankedPaper, SearchOutcome, SemanticHit};
use crate::store::PaperStore;
use crate::vector::VectorIndex;

/// The hybrid search orchestrator.
///
/// Holds the relational [`PaperStore`] (required) plus optional semantic
/// and expansion collaborators. Construct one via
/// [`SearchEngine::builder()`]; an engine with only a store degrades to
/// plain keyword search.
pub struct SearchEngine {
    config: SearchConfig,
    store: PaperStore,
    vector_index: Option<Arc<dyn VectorIndex>>,
    embedder: Option<Arc<dyn Embedder>>,
    expander: Option<Arc<dyn QueryExpander>>,
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("config", &self.config)
            .field("vector_index", &self.vector_index.is_some())
            .field("embedder", &self.embedder.is_some())
            .field("expander", &self.expander.is_some())
            .finish_non_exhaustive()
    }
}

impl SearchEngine {
    /// Create a new [`SearchEngineBuilder`].
    pub fn builder() -> SearchEngineBuilder {
        SearchEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Return a reference to the paper store, e.g. for browse queries.
    pub fn store(&self) -> &PaperStore {
        &self.store
    }

    /// Run a hybrid search returning at most `config.top_k` papers.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::StoreError`] if the paper store fails;
    /// expansion and semantic failures degrade the outcome instead.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome> {
        self.search_with_limit(query, self.config.top_k).await
    }

    /// Run a hybrid search returning at most `top_k` papers.
    ///
    /// `top_k` also bounds the depth of each per-variant keyword and
    /// semantic candidate list. An empty or whitespace-only query returns
    /// an empty outcome without calling any collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::StoreError`] if the paper store fails;
    /// expansion and semantic failures degrade the outcome instead.
    pub async fn search_with_limit(&self, query: &str, top_k: usize) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchOutcome::default());
        }

        // 1. Expand the query
        let expanded = self.expanded_queries(query).await;

        // 2. Run keyword and semantic lookups for every variant concurrently
        let keyword_futures = expanded.iter().map(|q| self.store.keyword_search(q, top_k));
        let semantic_futures = expanded.iter().map(|q| self.semantic_lookup(q, top_k));
        let (keyword_lists, semantic_outcomes) =
            join(try_join_all(keyword_futures), join_all(semantic_futures)).await;
        let keyword_lists = keyword_lists?;

        let mut semantic_degraded = false;
        let mut semantic_hits: Vec<Vec<SemanticHit>> = Vec::with_capacity(expanded.len());
        for outcome in semantic_outcomes {
            match outcome {
                Some(hits) => semantic_hits.push(hits),
                None => {
                    semantic_degraded = true;
                    semantic_hits.push(Vec::new());
                }
            }
        }
        let semantic_lists: Vec<Vec<PaperId>> = semantic_hits
            .iter()
            .map(|hits| hits.iter().map(|hit| hit.paper_id).collect())
            .collect();

        // 3. Fuse the rankings
        let params = FusionParams {
            rrf_k: self.config.rrf_k,
            keyword_boost: self.config.keyword_boost,
            top_k,
        };
        let fused = reciprocal_rank_fusion(&keyword_lists, &semantic_lists, params);

        // 4. Materialize papers in fused order
        let ids: Vec<PaperId> = fused.iter().map(|hit| hit.paper_id).collect();
        let papers = self.store.fetch_by_ids(&ids).await?;

        // 5. Attach scores and matched source texts
        let score_by_id: HashMap<PaperId, f64> =
            fused.iter().map(|hit| (hit.paper_id, hit.score)).collect();
        let mut texts_by_id = source_texts_by_paper(&semantic_hits);
        let papers: Vec<RankedPaper> = papers
            .into_iter()
            .map(|paper| RankedPaper {
                score: score_by_id.get(&paper.id).copied().unwrap_or_default(),
                source_texts: texts_by_id.remove(&paper.id).unwrap_or_default(),
                paper,
            })
            .collect();

        info!(
            query,
            variants = expanded.len(),
            result_count = papers.len(),
            semantic_degraded,
            "hybrid search completed"
        );

        Ok(SearchOutcome { papers, expanded_queries: expanded, semantic_degraded })
    }

    /// Resolve the query variants to search. Expansion is bounded by the
    /// configured deadline and degrades to the literal query on expiry.
    async fn expanded_queries(&self, query: &str) -> Vec<String> {
        let Some(expander) = &self.expander else {
            return vec![query.to_string()];
        };
        match timeout(self.config.expansion_timeout, expander.expand(query)).await {
            Ok(queries) => queries,
            Err(_) => {
                warn!(query, "query expansion timed out, searching the literal query only");
                vec![query.to_string()]
            }
        }
    }

    /// Produce the thresholded, deduplicated semantic ranking for one
    /// query variant. `None` means the semantic signal is unavailable for
    /// this variant: unconfigured, failed, or timed out. An empty `Some`
    /// means the lookup ran and no candidate survived the distance cutoff.
    async fn semantic_lookup(&self, query: &str, top_k: usize) -> Option<Vec<SemanticHit>> {
        let (index, embedder) = match (&self.vector_index, &self.embedder) {
            (Some(index), Some(embedder)) => (index, embedder),
            _ => return None,
        };

        let deadline = self.config.semantic_timeout;
        let embedding = match timeout(deadline, embedder.embed(query)).await {
            Ok(Ok(embedding)) => embedding,
            Ok(Err(err)) => {
                warn!(query, error = %err, "embedding failed, dropping semantic signal");
                return None;
            }
            Err(_) => {
                warn!(query, "embedding timed out, dropping semantic signal");
                return None;
            }
        };

        let hits = match timeout(deadline, index.search(&embedding, top_k)).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(err)) => {
                warn!(query, error = %err, "vector search failed, dropping semantic signal");
                return None;
            }
            Err(_) => {
                warn!(query, "vector search timed out, dropping semantic signal");
                return None;
            }
        };

        Some(rank_semantic_hits(hits, self.config.distance_threshold))
    }
}

/// Order raw vector hits into a semantic ranking: apply the distance
/// cutoff to every candidate independently, sort by ascending distance
/// (ties by ascending paper id), and keep only each paper's closest hit.
fn rank_semantic_hits(hits: Vec<SemanticHit>, threshold: f32) -> Vec<SemanticHit> {
    let mut kept: Vec<SemanticHit> =
        hits.into_iter().filter(|hit| hit.distance < threshold).collect();
    kept.sort_by(|a, b| {
        a.distance.total_cmp(&b.distance).then_with(|| a.paper_id.cmp(&b.paper_id))
    });

    let mut seen = HashSet::new();
    kept.retain(|hit| seen.insert(hit.paper_id));
    kept
}

/// Collect each paper's matched source texts across all query variants,
/// deduplicated, in first-seen order.
fn source_texts_by_paper(semantic_hits: &[Vec<SemanticHit>]) -> HashMap<PaperId, Vec<String>> {
    let mut texts: HashMap<PaperId, Vec<String>> = HashMap::new();
    for hits in semantic_hits {
        for hit in hits {
            let Some(text) = &hit.source_text else { continue };
            let entry = texts.entry(hit.paper_id).or_default();
            if !entry.iter().any(|existing| existing == text) {
                entry.push(text.clone());
            }
        }
    }
    texts
}

/// Builder for constructing a [`SearchEngine`].
///
/// `config` and `store` are required. `vector_index` and `embedder`
/// enable the semantic channel and must be set together; `expander` is
/// independent of both.
///
/// # Example
///
/// ```rust,ignore
/// let engine = SearchEngine::builder()
///     .config(SearchConfig::default())
///     .store(store)
///     .build()?;  // keyword-only engine
/// ```
#[derive(Default)]
pub struct SearchEngineBuilder {
    config: Option<SearchConfig>,
    store: Option<PaperStore>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    embedder: Option<Arc<dyn Embedder>>,
    expander: Option<Arc<dyn QueryExpander>>,
}

impl SearchEngineBuilder {
    /// Set the engine configuration.
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the relational paper store.
    pub fn store(mut self, store: PaperStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the vector index backend for the semantic channel.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }

    /// Set the embedder for the semantic channel.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set an optional query expander.
    pub fn expander(mut self, expander: Arc<dyn QueryExpander>) -> Self {
        self.expander = Some(expander);
        self
    }

    /// Build the [`SearchEngine`], validating the wiring.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ConfigError`] if `config` or `store` is
    /// missing, or if exactly one of `vector_index` and `embedder` is set.
    pub fn build(self) -> Result<SearchEngine> {
        let config =
            self.config.ok_or_else(|| SearchError::ConfigError("config is required".to_string()))?;
        let store =
            self.store.ok_or_else(|| SearchError::ConfigError("store is required".to_string()))?;
        if self.vector_index.is_some() != self.embedder.is_some() {
            return Err(SearchError::ConfigError(
                "vector_index and embedder must be configured together".to_string(),
            ));
        }

        Ok(SearchEngine {
            config,
            store,
            vector_index: self.vector_index,
            embedder: self.embedder,
            expander: self.expander,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(paper_id: PaperId, distance: f32) -> SemanticHit {
        SemanticHit { paper_id, distance, source_text: None }
    }

    fn hit_with_text(paper_id: PaperId, distance: f32, text: &str) -> SemanticHit {
        SemanticHit { paper_id, distance, source_text: Some(text.to_string()) }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let ranked = rank_semantic_hits(vec![hit(1, 0.29), hit(2, 0.3), hit(3, 0.31)], 0.3);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].paper_id, 1);
    }

    #[test]
    fn test_every_candidate_filtered_independently() {
        // A far hit in the middle must not mask closer hits after it.
        let ranked = rank_semantic_hits(vec![hit(1, 0.1), hit(2, 0.9), hit(3, 0.2)], 0.3);
        let ids: Vec<PaperId> = ranked.iter().map(|h| h.paper_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_nan_distances_are_dropped() {
        let ranked = rank_semantic_hits(vec![hit(1, f32::NAN), hit(2, 0.1)], 0.3);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].paper_id, 2);
    }

    #[test]
    fn test_same_paper_keeps_closest_hit_only() {
        let ranked = rank_semantic_hits(
            vec![hit_with_text(1, 0.25, "far chunk"), hit_with_text(1, 0.05, "near chunk")],
            0.3,
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].distance, 0.05);
        assert_eq!(ranked[0].source_text.as_deref(), Some("near chunk"));
    }

    #[test]
    fn test_equal_distances_order_by_paper_id() {
        let ranked = rank_semantic_hits(vec![hit(9, 0.1), hit(4, 0.1)], 0.3);
        let ids: Vec<PaperId> = ranked.iter().map(|h| h.paper_id).collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn test_source_texts_dedupe_in_first_seen_order() {
        let lists = vec![
            vec![hit_with_text(1, 0.1, "alpha")],
            vec![hit_with_text(1, 0.2, "beta"), hit_with_text(2, 0.2, "gamma")],
            vec![hit_with_text(1, 0.15, "alpha")],
        ];
        let texts = source_texts_by_paper(&lists);
        assert_eq!(texts[&1], vec!["alpha", "beta"]);
        assert_eq!(texts[&2], vec!["gamma"]);
    }

    #[test]
    fn test_hits_without_text_contribute_nothing() {
        let lists = vec![vec![hit(1, 0.1)]];
        assert!(source_texts_by_paper(&lists).is_empty());
    }
}
