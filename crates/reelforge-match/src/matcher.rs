//! Cosine-similarity ranking over the feature store.

use std::sync::Arc;

use tracing::debug;

use reelforge_models::MatchResult;
use reelforge_store::FeatureStore;

use crate::embed::TextEmbedder;
use crate::error::{MatchError, MatcherResult};

/// Ranks feature store records against a search phrase.
///
/// Pure query: neither the store nor the embedder handle is mutated.
pub struct MaterialMatcher {
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<FeatureStore>,
}

impl MaterialMatcher {
    /// Create a matcher over a populated store.
    pub fn new(embedder: Arc<dyn TextEmbedder>, store: Arc<FeatureStore>) -> Self {
        Self { embedder, store }
    }

    /// Rank all store records by cosine similarity to `phrase`,
    /// descending. Ties keep store insertion order. An empty phrase
    /// returns an empty ranking without touching the embedder.
    pub async fn match_phrase(&self, phrase: &str) -> MatcherResult<Vec<MatchResult>> {
        if phrase.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(phrase).await?;
        let query = match l2_normalize(&query) {
            Some(q) => q,
            None => return Err(MatchError::EmptyEmbedding),
        };

        let mut results = Vec::with_capacity(self.store.len());
        for record in self.store.records() {
            if record.embedding.len() != query.len() {
                return Err(MatchError::DimensionMismatch {
                    query: query.len(),
                    record: record.embedding.len(),
                });
            }

            // Zero-norm record embeddings score 0.
            let score = match l2_normalize(&record.embedding) {
                Some(normalized) => dot(&query, &normalized),
                None => 0.0,
            };

            results.push(MatchResult {
                content_loc: record.content_loc.clone(),
                duration: record.duration,
                score,
            });
        }

        // sort_by is stable, so equal scores keep insertion order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        debug!("Ranked {} records for phrase '{}'", results.len(), phrase);
        Ok(results)
    }
}

/// Normalize to unit length. Returns None for a zero (or non-finite)
/// norm.
fn l2_normalize(v: &[f32]) -> Option<Vec<f32>> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= 0.0 || !norm.is_finite() {
        return None;
    }
    Some(v.iter().map(|x| x / norm).collect())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reelforge_models::FeatureRecord;

    /// Maps known phrases to fixed vectors.
    struct FakeEmbedder(Vec<f32>);

    #[async_trait]
    impl TextEmbedder for FakeEmbedder {
        async fn embed(&self, _text: &str) -> MatcherResult<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    fn record(id: u64, embedding: Vec<f32>) -> FeatureRecord {
        FeatureRecord {
            id,
            title: format!("clip {}", id),
            content_loc: format!("https://example.com/video/{}", id),
            thumbnail_loc: format!("thumb-{}", id),
            embedding,
            duration: 10.0,
        }
    }

    fn store_with(records: Vec<FeatureRecord>) -> Arc<FeatureStore> {
        let mut store = FeatureStore::new();
        for r in records {
            store.insert(r).unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_empty_phrase_short_circuits() {
        let matcher = MaterialMatcher::new(
            Arc::new(FakeEmbedder(vec![1.0, 0.0])),
            store_with(vec![record(1, vec![1.0, 0.0])]),
        );
        assert!(matcher.match_phrase("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scores_sorted_descending() {
        let store = store_with(vec![
            record(1, vec![0.0, 1.0]),   // orthogonal, score 0
            record(2, vec![1.0, 0.0]),   // aligned, score 1
            record(3, vec![1.0, 1.0]),   // 45 degrees, score ~0.707
        ]);
        let matcher = MaterialMatcher::new(Arc::new(FakeEmbedder(vec![2.0, 0.0])), store);

        let ranked = matcher.match_phrase("query").await.unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.content_loc.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "https://example.com/video/2",
                "https://example.com/video/3",
                "https://example.com/video/1"
            ]
        );
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        // Two identical embeddings tie exactly.
        let store = store_with(vec![
            record(10, vec![1.0, 0.0]),
            record(20, vec![1.0, 0.0]),
        ]);
        let matcher = MaterialMatcher::new(Arc::new(FakeEmbedder(vec![1.0, 0.0])), store);

        let ranked = matcher.match_phrase("query").await.unwrap();
        assert_eq!(ranked[0].content_loc, "https://example.com/video/10");
        assert_eq!(ranked[1].content_loc, "https://example.com/video/20");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        let store = store_with(vec![record(1, vec![1.0, 0.0, 0.0])]);
        let matcher = MaterialMatcher::new(Arc::new(FakeEmbedder(vec![1.0, 0.0])), store);

        assert!(matches!(
            matcher.match_phrase("query").await,
            Err(MatchError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        assert!(l2_normalize(&[0.0, 0.0]).is_none());
        let unit = l2_normalize(&[3.0, 4.0]).unwrap();
        assert!((unit[0] - 0.6).abs() < 1e-6);
        assert!((unit[1] - 0.8).abs() < 1e-6);
    }
}
