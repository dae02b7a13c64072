//! Relational paper store backed by SQLite.
//!
//! Provides [`PaperStore`], the engine's read-only view of the paper
//! library using [sqlx](https://docs.rs/sqlx). The schema is owned by the
//! ingestion pipeline; this module only queries it.
//!
//! # Example
//!
//! ```rust,ignore
//! use paperscope::store::PaperStore;
//!
//! let store = PaperStore::connect("sqlite:papers.db").await?;
//! let ids = store.keyword_search("diffusion", 5).await?;
//! let papers = store.fetch_by_ids(&ids).await?;
//! ```

use std::collections::HashMap;

use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::Result;
use crate::paper::{Paper, PaperId};

/// Columns materialized into a [`Paper`]. The `abstract` column is
/// searched by [`PaperStore::keyword_search`] but never fetched.
const PAPER_COLUMNS: &str = "id, title, authors, conference, year, file_path, keywords, summary";

/// Read-only access to the `papers` table.
///
/// All queries are deterministic: result order is always fixed by an
/// explicit `ORDER BY` or by the caller's id list. Cloning is cheap, the
/// underlying pool is shared.
#[derive(Clone)]
pub struct PaperStore {
    pool: SqlitePool,
}

impl PaperStore {
    /// Create a new paper store by connecting to the given database URL.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::StoreError`](crate::SearchError::StoreError)
    /// if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new().max_connections(5).connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Create a new paper store from an existing connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find papers whose title, authors, keyword annotation, or abstract
    /// contains `query` as a substring, case-insensitively.
    ///
    /// LIKE metacharacters in `query` (`%`, `_`, `\`) are escaped and
    /// match literally. Returns at most `limit` paper ids in ascending id
    /// order. An empty or whitespace-only query returns no ids without
    /// touching the database.
    pub async fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<PaperId>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{}%", escape_like(trimmed));
        let rows = sqlx::query(
            "SELECT id FROM papers \
             WHERE title LIKE ?1 ESCAPE '\\' \
                OR authors LIKE ?1 ESCAPE '\\' \
                OR keywords LIKE ?1 ESCAPE '\\' \
                OR abstract LIKE ?1 ESCAPE '\\' \
             ORDER BY id \
             LIMIT ?2",
        )
        .bind(&pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            ids.push(row.try_get::<PaperId, _>("id")?);
        }
        debug!(query = trimmed, count = ids.len(), "keyword search completed");
        Ok(ids)
    }

    /// Materialize papers for the given ids, preserving the order of `ids`.
    ///
    /// Ids with no matching row are dropped silently; a paper deleted
    /// between ranking and materialization shrinks the result rather than
    /// failing it. Duplicate ids collapse to their first occurrence.
    pub async fn fetch_by_ids(&self, ids: &[PaperId]) -> Result<Vec<Paper>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT {PAPER_COLUMNS} FROM papers WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut by_id: HashMap<PaperId, Paper> = HashMap::with_capacity(rows.len());
        for row in &rows {
            let paper = row_to_paper(row)?;
            by_id.insert(paper.id, paper);
        }

        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(paper) = by_id.remove(id) {
                ordered.push(paper);
            }
        }

        debug!(requested = ids.len(), found = ordered.len(), "materialized papers");
        Ok(ordered)
    }

    /// Browse papers matching the given filter, newest first (descending id).
    ///
    /// The keyword filter matches title, authors, and the keyword
    /// annotation; unlike [`keyword_search`](PaperStore::keyword_search)
    /// it does not search abstracts.
    pub async fn filter_papers(&self, filter: &PaperFilter) -> Result<Vec<Paper>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PAPER_COLUMNS} FROM papers WHERE 1=1"
        ));

        if let Some(keyword) = filter.keyword.as_deref().map(str::trim) {
            if !keyword.is_empty() {
                let pattern = format!("%{}%", escape_like(keyword));
                qb.push(" AND (title LIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\' OR authors LIKE ");
                qb.push_bind(pattern.clone());
                qb.push(" ESCAPE '\\' OR keywords LIKE ");
                qb.push_bind(pattern);
                qb.push(" ESCAPE '\\')");
            }
        }
        if let Some(year) = filter.year {
            qb.push(" AND year = ");
            qb.push_bind(year);
        }
        if let Some(conference) = &filter.conference {
            qb.push(" AND conference = ");
            qb.push_bind(conference.clone());
        }
        qb.push(" ORDER BY id DESC LIMIT ");
        qb.push_bind(filter.limit as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_paper).collect()
    }

    /// List the distinct `(conference, year)` pairs present in the library,
    /// ordered by conference name, then by year descending.
    pub async fn conferences(&self) -> Result<Vec<(String, i64)>> {
        let rows =
            sqlx::query("SELECT DISTINCT conference, year FROM papers ORDER BY conference, year DESC")
                .fetch_all(&self.pool)
                .await?;
        rows.iter()
            .map(|row| Ok((row.try_get("conference")?, row.try_get("year")?)))
            .collect()
    }
}

/// Filter criteria for [`PaperStore::filter_papers`].
#[derive(Debug, Clone)]
pub struct PaperFilter {
    /// Substring to match against title, authors, and keyword annotation.
    pub keyword: Option<String>,
    /// Restrict to a single publication year.
    pub year: Option<i64>,
    /// Restrict to a single conference (exact match).
    pub conference: Option<String>,
    /// Maximum number of papers to return.
    pub limit: usize,
}

impl Default for PaperFilter {
    fn default() -> Self {
        Self { keyword: None, year: None, conference: None, limit: 50 }
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn row_to_paper(row: &SqliteRow) -> Result<Paper> {
    Ok(Paper {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        authors: row.try_get("authors")?,
        conference: row.try_get("conference")?,
        year: row.try_get("year")?,
        file_path: row.try_get("file_path")?,
        keywords: row.try_get("keywords")?,
        summary: row.try_get("summary")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_metacharacters() {
        assert_eq!(escape_like("100% _raw_"), "100\\% \\_raw\\_");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
