//! Data types for papers, semantic hits, and search results.

use serde::{Deserialize, Serialize};

/// Identifier of a paper in the relational store.
pub type PaperId = i64;

/// A paper record from the relational store.
///
/// Freeform annotations produced by the ingestion pipeline are carried
/// verbatim in [`keywords`](Paper::keywords) and [`summary`](Paper::summary);
/// use [`keyword_sets()`](Paper::keyword_sets) and
/// [`structured_summary()`](Paper::structured_summary) to decode them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    /// Unique identifier for the paper.
    pub id: PaperId,
    /// The paper title.
    pub title: String,
    /// Comma-separated author names.
    pub authors: String,
    /// The venue the paper appeared at.
    pub conference: String,
    /// The publication year.
    pub year: i64,
    /// Path to the paper's source file on disk.
    pub file_path: String,
    /// Raw keyword annotation, JSON-encoded by ingestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Raw structured-summary annotation, JSON-encoded by ingestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Paper {
    /// Decode the keyword annotation into author and generated keyword sets.
    ///
    /// Returns `None` when the annotation is absent or is not valid JSON
    /// of the expected shape. Annotations are advisory, so a malformed
    /// one never fails a search.
    pub fn keyword_sets(&self) -> Option<KeywordSets> {
        let raw = self.keywords.as_deref()?;
        serde_json::from_str(raw).ok()
    }

    /// Decode the structured-summary annotation.
    ///
    /// Returns `None` when the annotation is absent or malformed,
    /// including the literal `"N/A"` ingestion writes on analysis failure.
    pub fn structured_summary(&self) -> Option<StructuredSummary> {
        let raw = self.summary.as_deref()?;
        serde_json::from_str(raw).ok()
    }
}

/// Keyword annotation decoded from a [`Paper`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KeywordSets {
    /// Keywords the paper's authors supplied.
    #[serde(default)]
    pub author: Vec<String>,
    /// Conceptual keywords generated during ingestion.
    #[serde(default)]
    pub generative: Vec<String>,
}

/// Structured-summary annotation decoded from a [`Paper`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredSummary {
    /// Core problem or research gap the paper addresses.
    pub motivation: String,
    /// Proposed solution, technique, or framework.
    pub methodology: String,
    /// Main findings, performance gains, or contributions.
    pub key_results: String,
}

/// A single candidate returned by a vector index lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticHit {
    /// The paper the indexed point belongs to.
    pub paper_id: PaperId,
    /// Cosine distance between the query and the point (lower is closer).
    pub distance: f32,
    /// The indexed text for chunk-granularity points, if stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

/// A fused search result: a materialized [`Paper`] with its score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedPaper {
    /// The materialized paper record.
    pub paper: Paper,
    /// The fused relevance score (higher is more relevant).
    pub score: f64,
    /// Matched semantic source texts, deduplicated, in first-seen order.
    /// Empty for keyword-only matches and paper-granularity indexes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_texts: Vec<String>,
}

/// The complete result of one hybrid search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchOutcome {
    /// Ranked papers, best first.
    pub papers: Vec<RankedPaper>,
    /// The query variants that were searched, the literal query first.
    pub expanded_queries: Vec<String>,
    /// True when the semantic channel was unavailable, failed, or timed
    /// out for at least one query variant. Keyword results are still valid.
    pub semantic_degraded: bool,
}
