//! Configuration for the hybrid search engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

const ENV_TOP_K: &str = "PAPERSCOPE_TOP_K";
const ENV_DISTANCE_THRESHOLD: &str = "PAPERSCOPE_DISTANCE_THRESHOLD";
const ENV_RRF_K: &str = "PAPERSCOPE_RRF_K";
const ENV_KEYWORD_BOOST: &str = "PAPERSCOPE_KEYWORD_BOOST";
const ENV_EXPANSION_TIMEOUT_SECS: &str = "PAPERSCOPE_EXPANSION_TIMEOUT_SECS";
const ENV_SEMANTIC_TIMEOUT_SECS: &str = "PAPERSCOPE_SEMANTIC_TIMEOUT_SECS";

/// Configuration parameters for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    /// Number of fused results to return, and the depth of each
    /// per-query keyword and semantic candidate list.
    pub top_k: usize,
    /// Cosine distance cutoff for semantic candidates. Candidates at or
    /// above this distance are dropped before fusion.
    pub distance_threshold: f32,
    /// The `K` constant in the reciprocal rank formula `1 / (K + rank + 1)`.
    pub rrf_k: usize,
    /// Flat bonus added once to the fused score of every paper that
    /// appeared in at least one keyword candidate list.
    pub keyword_boost: f64,
    /// Deadline for the query expansion call. On expiry the engine
    /// searches the literal query only.
    pub expansion_timeout: Duration,
    /// Deadline for each embedding and vector index call. On expiry the
    /// semantic signal for that query is dropped.
    pub semantic_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            distance_threshold: 0.3,
            rrf_k: 60,
            keyword_boost: 0.05,
            expansion_timeout: Duration::from_secs(10),
            semantic_timeout: Duration::from_secs(10),
        }
    }
}

impl SearchConfig {
    /// Create a new builder for constructing a [`SearchConfig`].
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Build a [`SearchConfig`] from `PAPERSCOPE_*` environment variables.
    ///
    /// Recognized variables, each falling back to the default when unset:
    ///
    /// - `PAPERSCOPE_TOP_K`
    /// - `PAPERSCOPE_DISTANCE_THRESHOLD`
    /// - `PAPERSCOPE_RRF_K`
    /// - `PAPERSCOPE_KEYWORD_BOOST`
    /// - `PAPERSCOPE_EXPANSION_TIMEOUT_SECS`
    /// - `PAPERSCOPE_SEMANTIC_TIMEOUT_SECS`
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ConfigError`] if a variable is set but does
    /// not parse, or if the resulting configuration fails validation.
    pub fn from_env() -> Result<SearchConfig> {
        let mut builder = SearchConfig::builder();
        if let Some(top_k) = env_parse::<usize>(ENV_TOP_K)? {
            builder = builder.top_k(top_k);
        }
        if let Some(threshold) = env_parse::<f32>(ENV_DISTANCE_THRESHOLD)? {
            builder = builder.distance_threshold(threshold);
        }
        if let Some(rrf_k) = env_parse::<usize>(ENV_RRF_K)? {
            builder = builder.rrf_k(rrf_k);
        }
        if let Some(boost) = env_parse::<f64>(ENV_KEYWORD_BOOST)? {
            builder = builder.keyword_boost(boost);
        }
        if let Some(secs) = env_parse::<u64>(ENV_EXPANSION_TIMEOUT_SECS)? {
            builder = builder.expansion_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_parse::<u64>(ENV_SEMANTIC_TIMEOUT_SECS)? {
            builder = builder.semantic_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

/// Read and parse an environment variable, treating "unset" as `None`.
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SearchError::ConfigError(format!("invalid {name} value '{raw}': {e}"))),
        Err(_) => Ok(None),
    }
}

/// Builder for constructing a validated [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the number of fused results to return.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the cosine distance cutoff for semantic candidates.
    pub fn distance_threshold(mut self, threshold: f32) -> Self {
        self.config.distance_threshold = threshold;
        self
    }

    /// Set the `K` constant of the reciprocal rank formula.
    pub fn rrf_k(mut self, k: usize) -> Self {
        self.config.rrf_k = k;
        self
    }

    /// Set the flat bonus for papers with at least one keyword match.
    pub fn keyword_boost(mut self, boost: f64) -> Self {
        self.config.keyword_boost = boost;
        self
    }

    /// Set the deadline for the query expansion call.
    pub fn expansion_timeout(mut self, timeout: Duration) -> Self {
        self.config.expansion_timeout = timeout;
        self
    }

    /// Set the deadline for each embedding and vector index call.
    pub fn semantic_timeout(mut self, timeout: Duration) -> Self {
        self.config.semantic_timeout = timeout;
        self
    }

    /// Build the [`SearchConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ConfigError`] if:
    /// - `top_k == 0` or `rrf_k == 0`
    /// - `distance_threshold` is not a finite positive number
    /// - `keyword_boost` is negative or not finite
    /// - either timeout is zero
    pub fn build(self) -> Result<SearchConfig> {
        if self.config.top_k == 0 {
            return Err(SearchError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.config.rrf_k == 0 {
            return Err(SearchError::ConfigError("rrf_k must be greater than zero".to_string()));
        }
        if !self.config.distance_threshold.is_finite() || self.config.distance_threshold <= 0.0 {
            return Err(SearchError::ConfigError(format!(
                "distance_threshold ({}) must be a finite positive number",
                self.config.distance_threshold
            )));
        }
        if !self.config.keyword_boost.is_finite() || self.config.keyword_boost < 0.0 {
            return Err(SearchError::ConfigError(format!(
                "keyword_boost ({}) must be finite and non-negative",
                self.config.keyword_boost
            )));
        }
        if self.config.expansion_timeout.is_zero() || self.config.semantic_timeout.is_zero() {
            return Err(SearchError::ConfigError("timeouts must be non-zero".to_string()));
        }
        Ok(self.config)
    }
}
