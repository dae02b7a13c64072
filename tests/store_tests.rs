//! Integration tests for the SQLite paper store.

use paperscope::store::{PaperFilter, PaperStore};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// One pooled connection so the in-memory database is shared.
async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::query(
        "CREATE TABLE papers (\
            id INTEGER PRIMARY KEY, \
            title TEXT NOT NULL, \
            authors TEXT NOT NULL, \
            abstract TEXT, \
            conference TEXT NOT NULL, \
            year INTEGER NOT NULL, \
            file_path TEXT NOT NULL, \
            keywords TEXT, \
            summary TEXT\
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    pool
}

#[allow(clippy::too_many_arguments)]
async fn insert_paper(
    pool: &SqlitePool,
    id: i64,
    title: &str,
    authors: &str,
    abstract_text: &str,
    conference: &str,
    year: i64,
    keywords: Option<&str>,
    summary: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO papers (id, title, authors, abstract, conference, year, file_path, keywords, summary) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(id)
    .bind(title)
    .bind(authors)
    .bind(abstract_text)
    .bind(conference)
    .bind(year)
    .bind(format!("/papers/{id}.pdf"))
    .bind(keywords)
    .bind(summary)
    .execute(pool)
    .await
    .unwrap();
}

async fn seeded_store() -> PaperStore {
    let pool = memory_pool().await;
    insert_paper(
        &pool,
        1,
        "LoRA: Low-Rank Adaptation of Large Language Models",
        "Hu; Shen; Wallis",
        "We propose freezing pretrained weights and injecting trainable rank decomposition matrices.",
        "ICLR",
        2022,
        Some(r#"{"author": ["LoRA"], "generative": ["parameter-efficient fine-tuning"]}"#),
        None,
    )
    .await;
    insert_paper(
        &pool,
        2,
        "Efficient Transfer with Adapters",
        "Houlsby; Giurgiu",
        "Adapter layers enable transfer without touching the backbone.",
        "ICML",
        2019,
        None,
        None,
    )
    .await;
    insert_paper(
        &pool,
        3,
        "Denoising Diffusion Probabilistic Models",
        "Ho; Jain; Abbeel",
        "Diffusion probabilistic models trained with a denoising objective.",
        "NeurIPS",
        2020,
        Some(r#"{"author": [], "generative": ["generative models"]}"#),
        Some(r#"{"motivation": "m", "methodology": "d", "key_results": "r"}"#),
    )
    .await;
    insert_paper(
        &pool,
        4,
        "A 100% _Strict_ Evaluation Protocol",
        "Qureshi",
        "Benchmarks under a strict protocol.",
        "NeurIPS",
        2020,
        None,
        None,
    )
    .await;
    insert_paper(
        &pool,
        5,
        "Scaling Laws for Neural Language Models",
        "Kaplan; McCandlish",
        "Loss scales as a power law with model size.",
        "arXiv",
        2020,
        None,
        None,
    )
    .await;
    PaperStore::from_pool(pool)
}

#[tokio::test]
async fn test_substring_match_across_fields() {
    let store = seeded_store().await;

    // Title
    assert_eq!(store.keyword_search("lora", 10).await.unwrap(), vec![1]);
    // Authors
    assert_eq!(store.keyword_search("abbeel", 10).await.unwrap(), vec![3]);
    // Keyword annotation
    assert_eq!(store.keyword_search("parameter-efficient", 10).await.unwrap(), vec![1]);
    // Abstract
    assert_eq!(store.keyword_search("adapter layers", 10).await.unwrap(), vec![2]);
}

#[tokio::test]
async fn test_matching_is_case_insensitive() {
    let store = seeded_store().await;
    assert_eq!(store.keyword_search("LORA", 10).await.unwrap(), vec![1]);
    assert_eq!(store.keyword_search("DiFfUsIoN", 10).await.unwrap(), vec![3]);
}

#[tokio::test]
async fn test_results_ascend_by_id_and_respect_limit() {
    let store = seeded_store().await;
    // "models" appears in the titles of papers 1, 3, and 5.
    assert_eq!(store.keyword_search("models", 10).await.unwrap(), vec![1, 3, 5]);
    assert_eq!(store.keyword_search("models", 2).await.unwrap(), vec![1, 3]);
}

#[tokio::test]
async fn test_empty_queries_return_nothing() {
    let store = seeded_store().await;
    assert!(store.keyword_search("", 10).await.unwrap().is_empty());
    assert!(store.keyword_search("   \t", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unmatched_query_returns_nothing() {
    let store = seeded_store().await;
    assert!(store.keyword_search("quantum chromodynamics", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_like_metacharacters_match_literally() {
    let store = seeded_store().await;
    // '%' and '_' are data, not wildcards: only paper 4 contains them.
    assert_eq!(store.keyword_search("100%", 10).await.unwrap(), vec![4]);
    assert_eq!(store.keyword_search("%", 10).await.unwrap(), vec![4]);
    assert_eq!(store.keyword_search("_strict_", 10).await.unwrap(), vec![4]);
    // A '_' that would wildcard-match "Adapters" must not.
    assert!(store.keyword_search("adapter_", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_by_ids_preserves_order_and_drops_missing() {
    let store = seeded_store().await;

    let papers = store.fetch_by_ids(&[3, 99, 1]).await.unwrap();
    let ids: Vec<i64> = papers.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 1]);

    assert!(store.fetch_by_ids(&[]).await.unwrap().is_empty());

    let papers = store.fetch_by_ids(&[1, 1, 3]).await.unwrap();
    let ids: Vec<i64> = papers.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_fetched_papers_carry_decodable_annotations() {
    let store = seeded_store().await;
    let papers = store.fetch_by_ids(&[1, 2, 3]).await.unwrap();

    let sets = papers[0].keyword_sets().unwrap();
    assert_eq!(sets.author, vec!["LoRA"]);

    assert!(papers[1].keyword_sets().is_none());
    assert!(papers[1].structured_summary().is_none());

    let summary = papers[2].structured_summary().unwrap();
    assert_eq!(summary.motivation, "m");
}

#[tokio::test]
async fn test_filter_papers_combines_criteria_newest_first() {
    let store = seeded_store().await;

    let by_year = store
        .filter_papers(&PaperFilter { year: Some(2020), ..Default::default() })
        .await
        .unwrap();
    let ids: Vec<i64> = by_year.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![5, 4, 3]);

    let by_conference = store
        .filter_papers(&PaperFilter { conference: Some("ICLR".to_string()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(by_conference.len(), 1);
    assert_eq!(by_conference[0].id, 1);

    let combined = store
        .filter_papers(&PaperFilter {
            keyword: Some("diffusion".to_string()),
            year: Some(2020),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(combined.len(), 1);
    assert_eq!(combined[0].id, 3);

    let limited = store
        .filter_papers(&PaperFilter { year: Some(2020), limit: 2, ..Default::default() })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn test_filter_keyword_does_not_search_abstracts() {
    let store = seeded_store().await;
    // "adapter layers" only occurs in paper 2's abstract.
    let papers = store
        .filter_papers(&PaperFilter {
            keyword: Some("adapter layers".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(papers.is_empty());
}

#[tokio::test]
async fn test_conferences_lists_distinct_pairs() {
    let store = seeded_store().await;
    let pairs = store.conferences().await.unwrap();
    // Papers 3 and 4 share (NeurIPS, 2020), which appears once.
    assert_eq!(
        pairs,
        vec![
            ("ICLR".to_string(), 2022),
            ("ICML".to_string(), 2019),
            ("NeurIPS".to_string(), 2020),
            ("arXiv".to_string(), 2020),
        ]
    );
}
