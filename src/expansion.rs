//! Query expansion for widening recall before retrieval.
//!
//! Provides the [`QueryExpander`] trait plus two implementations:
//! [`NoExpansion`] (search the literal query only) and
//! [`LlmQueryExpander`], which asks an OpenAI-compatible chat API for
//! related search terms. Expansion is advisory: whatever goes wrong, the
//! literal query is always searched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{Result, SearchError};

/// The default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// The default chat model for expansions.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Upper bound on related terms kept from the backend reply.
const MAX_RELATED_TERMS: usize = 5;

/// A source of query variants for hybrid retrieval.
///
/// # Example
///
/// ```rust,ignore
/// use paperscope::QueryExpander;
///
/// let expander = LlmQueryExpander::from_env()?;
/// let queries = expander.expand("LoRA").await;
/// assert_eq!(queries[0], "LoRA");
/// ```
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// Expand `query` into the list of query strings to search.
    ///
    /// The returned list is never empty and its first element is always
    /// the literal `query`; implementations that cannot produce variants
    /// return `[query]` rather than an error.
    async fn expand(&self, query: &str) -> Vec<String>;
}

/// A [`QueryExpander`] that returns the literal query unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

#[async_trait]
impl QueryExpander for NoExpansion {
    async fn expand(&self, query: &str) -> Vec<String> {
        vec![query.to_string()]
    }
}

/// A [`QueryExpander`] backed by an OpenAI-compatible chat completions API.
///
/// The backend is asked for 3 to 5 related search terms as a JSON object
/// (`{"queries": [...]}`); markdown code fences around the reply are
/// tolerated. Requests are made once, with no retries.
///
/// # Configuration
///
/// - `model` – defaults to `gpt-4o-mini`.
/// - `base_url` – defaults to `https://api.openai.com/v1`.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment variable.
pub struct LlmQueryExpander {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmQueryExpander {
    /// Create a new expander with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(SearchError::ExpansionError {
                backend: "llm".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
        })
    }

    /// Create a new expander from environment variables.
    ///
    /// Requires `OPENAI_API_KEY`; honors `PAPERSCOPE_EXPANSION_MODEL` and
    /// `PAPERSCOPE_EXPANSION_BASE_URL` when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| SearchError::ExpansionError {
            backend: "llm".into(),
            message: "OPENAI_API_KEY environment variable not set".into(),
        })?;
        let mut expander = Self::new(api_key)?;
        if let Ok(model) = std::env::var("PAPERSCOPE_EXPANSION_MODEL") {
            expander = expander.with_model(model);
        }
        if let Ok(base_url) = std::env::var("PAPERSCOPE_EXPANSION_BASE_URL") {
            expander = expander.with_base_url(base_url);
        }
        Ok(expander)
    }

    /// Set the chat model name (e.g. `deepseek-chat`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL (e.g. `https://api.deepseek.com/v1`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Ask the chat API for related terms. Fallible; [`expand`] turns
    /// failures into the degraded single-query list.
    ///
    /// [`expand`]: QueryExpander::expand
    async fn request_expansions(&self, query: &str) -> Result<Vec<String>> {
        let prompt = expansion_prompt(query);
        let request_body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: "You are a helpful assistant that strictly outputs JSON.",
                },
                ChatMessage { role: "user", content: &prompt },
            ],
            response_format: ResponseFormat { format_type: "json_object" },
            temperature: 0.2,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(backend = "llm", error = %e, "request failed");
                SearchError::ExpansionError {
                    backend: "llm".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(backend = "llm", %status, "API error");
            return Err(SearchError::ExpansionError {
                backend: "llm".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            SearchError::ExpansionError {
                backend: "llm".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let content = chat.choices.into_iter().next().map(|c| c.message.content).ok_or_else(
            || SearchError::ExpansionError {
                backend: "llm".into(),
                message: "API returned no choices".into(),
            },
        )?;

        let reply: ExpansionReply =
            serde_json::from_str(strip_code_fences(&content)).map_err(|e| {
                SearchError::ExpansionError {
                    backend: "llm".into(),
                    message: format!("malformed expansion reply: {e}"),
                }
            })?;
        Ok(reply.queries)
    }
}

#[async_trait]
impl QueryExpander for LlmQueryExpander {
    async fn expand(&self, query: &str) -> Vec<String> {
        match self.request_expansions(query).await {
            Ok(terms) => {
                let queries = normalize_expansions(query, terms);
                debug!(query, count = queries.len(), "expanded query");
                queries
            }
            Err(err) => {
                warn!(query, error = %err, "query expansion failed, searching the literal query only");
                vec![query.to_string()]
            }
        }
    }
}

fn expansion_prompt(query: &str) -> String {
    format!(
        "You are an expert research assistant. Propose 3 to 5 alternative search terms \
         closely related to the following query, suitable for retrieving academic papers. \
         Provide your output as a valid JSON object with a single key \"queries\", \
         which contains a list of strings.\n\n\
         Query: \"{query}\"\n\n\
         JSON Output:"
    )
}

/// Strip markdown code fences some chat models wrap JSON replies in.
fn strip_code_fences(content: &str) -> &str {
    let mut cleaned = content.trim();
    for fence in ["```json", "```"] {
        if let Some(rest) = cleaned.strip_prefix(fence) {
            cleaned = rest;
        }
        if let Some(rest) = cleaned.strip_suffix(fence) {
            cleaned = rest;
        }
    }
    cleaned.trim()
}

/// Turn a backend reply into the final query list: the literal query
/// first, then related terms with blanks and case-insensitive duplicates
/// removed, capped at [`MAX_RELATED_TERMS`].
fn normalize_expansions(query: &str, terms: Vec<String>) -> Vec<String> {
    let mut queries = vec![query.to_string()];
    for term in terms {
        if queries.len() > MAX_RELATED_TERMS {
            break;
        }
        let trimmed = term.trim();
        if trimmed.is_empty() {
            continue;
        }
        if queries.iter().any(|q| q.eq_ignore_ascii_case(trimmed)) {
            continue;
        }
        queries.push(trimmed.to_string());
    }
    queries
}

// ── API request/response types ─────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat<'a>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ExpansionReply {
    queries: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}
