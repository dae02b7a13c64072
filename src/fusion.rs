//! Reciprocal Rank Fusion of keyword and semantic rankings.
//!
//! Fusion consumes pure rankings: positions matter, raw scores and
//! distances do not. Every candidate list contributes `1 / (K + rank + 1)`
//! per appearance (rank is 0-indexed), papers with at least one keyword
//! match receive a single flat bonus, and ties are broken by ascending
//! paper id so results are stable across runs.

use std::collections::{HashMap, HashSet};

use crate::paper::PaperId;

/// Default `K` constant for the reciprocal rank formula.
///
/// 60 is the value recommended by Cormack, Clarke and Buettcher
/// (SIGIR 2009); it keeps single-list rank differences from dominating
/// cross-list agreement.
pub const DEFAULT_RRF_K: usize = 60;

/// Default flat bonus for papers with at least one keyword match.
pub const DEFAULT_KEYWORD_BOOST: f64 = 0.05;

/// Tuning constants for [`reciprocal_rank_fusion`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    /// The `K` constant in `1 / (K + rank + 1)`.
    pub rrf_k: usize,
    /// Flat bonus added once to every paper present in any keyword list.
    pub keyword_boost: f64,
    /// Number of fused hits to keep.
    pub top_k: usize,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self { rrf_k: DEFAULT_RRF_K, keyword_boost: DEFAULT_KEYWORD_BOOST, top_k: 5 }
    }
}

/// A paper id with its fused relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedHit {
    /// The scored paper.
    pub paper_id: PaperId,
    /// The fused relevance score (higher is more relevant).
    pub score: f64,
}

/// Fuse keyword and semantic rankings into a single scored list.
///
/// Each slice element is one ranked candidate list (one per query
/// variant per signal); an id should appear at most once per list. Every
/// appearance at 0-indexed `rank` contributes `1 / (rrf_k + rank + 1)`
/// to that paper's score, and papers present in at least one keyword
/// list receive `keyword_boost` exactly once, regardless of how many
/// keyword lists matched them.
///
/// Returns at most `top_k` hits ordered by descending score, ties broken
/// by ascending paper id.
pub fn reciprocal_rank_fusion(
    keyword_lists: &[Vec<PaperId>],
    semantic_lists: &[Vec<PaperId>],
    params: FusionParams,
) -> Vec<FusedHit> {
    let mut scores: HashMap<PaperId, f64> = HashMap::new();

    for list in keyword_lists.iter().chain(semantic_lists.iter()) {
        for (rank, paper_id) in list.iter().enumerate() {
            *scores.entry(*paper_id).or_insert(0.0) += 1.0 / (params.rrf_k + rank + 1) as f64;
        }
    }

    let keyword_papers: HashSet<PaperId> = keyword_lists.iter().flatten().copied().collect();
    for paper_id in keyword_papers {
        if let Some(score) = scores.get_mut(&paper_id) {
            *score += params.keyword_boost;
        }
    }

    let mut fused: Vec<FusedHit> =
        scores.into_iter().map(|(paper_id, score)| FusedHit { paper_id, score }).collect();
    fused.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.paper_id.cmp(&b.paper_id)));
    fused.truncate(params.top_k);
    fused
}
