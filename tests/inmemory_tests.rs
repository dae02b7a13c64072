//! Property tests for in-memory vector index search ordering.

use paperscope::PaperId;
use paperscope::inmemory::InMemoryVectorIndex;
use paperscope::vector::{DistanceMetric, VectorIndex};
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a point as a (paper id, normalized embedding) pair.
fn arb_point(dim: usize) -> impl Strategy<Value = (PaperId, Vec<f32>)> {
    (1i64..500, arb_normalized_embedding(dim))
}

/// For any set of stored points and any query, search returns hits
/// ordered by ascending distance, and never more than `top_k` of them.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn hits_ordered_ascending_and_bounded_by_top_k(
            points in proptest::collection::vec(arb_point(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (hits, stored) = rt.block_on(async {
                let index = InMemoryVectorIndex::new();
                for (paper_id, embedding) in &points {
                    index.add_paper(*paper_id, embedding.clone()).await;
                }
                let hits = index.search(&query, top_k).await.unwrap();
                (hits, points.len())
            });

            prop_assert!(hits.len() <= top_k);
            prop_assert!(hits.len() <= stored);

            for window in hits.windows(2) {
                prop_assert!(
                    window[0].distance <= window[1].distance,
                    "hits not in ascending order: {} > {}",
                    window[0].distance,
                    window[1].distance,
                );
            }
        }
    }
}

/// Searching with an embedding that is itself stored puts a hit at
/// effectively zero distance first.
mod prop_self_query_ranks_first {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn stored_embedding_is_its_own_nearest_neighbor(
            points in proptest::collection::vec(arb_point(DIM), 1..10),
            target in arb_point(DIM),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let hits = rt.block_on(async {
                let index = InMemoryVectorIndex::new();
                for (paper_id, embedding) in &points {
                    index.add_paper(*paper_id, embedding.clone()).await;
                }
                index.add_paper(target.0, target.1.clone()).await;
                index.search(&target.1, 1).await.unwrap()
            });

            prop_assert_eq!(hits.len(), 1);
            prop_assert!(
                hits[0].distance.abs() < 1e-3,
                "nearest hit sits at distance {}",
                hits[0].distance,
            );
        }
    }
}

#[tokio::test]
async fn test_distance_metric_is_cosine() {
    let index = InMemoryVectorIndex::new();
    assert_eq!(index.distance_metric().await.unwrap(), DistanceMetric::Cosine);
}

#[tokio::test]
async fn test_empty_index_returns_no_hits() {
    let index = InMemoryVectorIndex::new();
    let hits = index.search(&[1.0, 0.0], 5).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_zero_magnitude_vector_sits_at_unit_distance() {
    let index = InMemoryVectorIndex::new();
    index.add_paper(1, vec![0.0, 0.0]).await;

    let hits = index.search(&[1.0, 0.0], 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].distance, 1.0);
}

#[tokio::test]
async fn test_equal_distances_order_by_ascending_paper_id() {
    let index = InMemoryVectorIndex::new();
    index.add_paper(9, vec![0.0, 1.0]).await;
    index.add_paper(4, vec![0.0, 1.0]).await;

    let hits = index.search(&[0.0, 1.0], 5).await.unwrap();
    let ids: Vec<PaperId> = hits.iter().map(|h| h.paper_id).collect();
    assert_eq!(ids, vec![4, 9]);
}

#[tokio::test]
async fn test_chunk_points_carry_their_text() {
    let index = InMemoryVectorIndex::new();
    index.add_chunk(7, vec![1.0, 0.0], "the indexed passage").await;

    let hits = index.search(&[1.0, 0.0], 1).await.unwrap();
    assert_eq!(hits[0].source_text.as_deref(), Some("the indexed passage"));
}
