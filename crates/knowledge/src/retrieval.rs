//! Similarity search over the whole index.
//!
//! Retrieval is exhaustive: every stored vector is scored against the query,
//! which is fine at the index sizes a single JSON file can hold.

use crate::embeddings::EmbeddingClient;
use crate::store::IndexStore;
use crate::types::{ChunkRecord, ScoredChunk};
use ragdesk_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::instrument;

/// Fewest passages a question ever retrieves.
pub const MIN_TOP_K: i64 = 1;

/// Most passages a question ever retrieves.
pub const MAX_TOP_K: i64 = 10;

/// Character budget of the assembled context block.
pub const CONTEXT_CHAR_BUDGET: usize = 12_000;

/// Cosine similarity of two vectors.
///
/// A zero-magnitude vector scores 0 against anything. Vectors of different
/// lengths are compared over their common prefix. The result is clamped to
/// `[-1, 1]` to absorb rounding.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };

    ((dot / denominator) as f32).clamp(-1.0, 1.0)
}

/// Clamp a caller-supplied passage count to `[MIN_TOP_K, MAX_TOP_K]`.
pub fn clamp_top_k(top_k: i64) -> usize {
    top_k.clamp(MIN_TOP_K, MAX_TOP_K) as usize
}

/// Score every record, sort by descending score and keep the best `top_k`.
///
/// Equal scores keep their index order.
pub fn rank(query: &[f32], records: Vec<ChunkRecord>, top_k: i64) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = records
        .into_iter()
        .map(|record| {
            let score = cosine_similarity(query, &record.embedding);
            ScoredChunk { record, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(clamp_top_k(top_k));
    scored
}

/// Numbered context block: `[[1]] text`, blank-line separated, cut to the
/// character budget. The cut may fall inside the last passage.
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    let context = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[[{}]] {}", i + 1, chunk.record.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    match context.char_indices().nth(CONTEXT_CHAR_BUDGET) {
        Some((cut, _)) => context[..cut].to_string(),
        None => context,
    }
}

/// Embeds questions and ranks the persisted index against them.
#[derive(Debug, Clone)]
pub struct Retriever {
    embeddings: Arc<EmbeddingClient>,
    store: IndexStore,
}

impl Retriever {
    pub fn new(embeddings: Arc<EmbeddingClient>, store: IndexStore) -> Self {
        Self { embeddings, store }
    }

    /// Top passages for `query`.
    ///
    /// # Errors
    /// - `AppError::EmptyIndex` when nothing has been ingested; checked before
    ///   the query is embedded.
    /// - `AppError::Index` when the query vector and the stored vectors differ
    ///   in length, which means the embedding model changed since ingest.
    #[instrument(skip(self, query))]
    pub async fn retrieve(&self, query: &str, top_k: i64) -> AppResult<Vec<ScoredChunk>> {
        let index = self.store.load().await;
        if index.is_empty() {
            return Err(AppError::EmptyIndex);
        }

        let query_vector = self.embeddings.embed_one(query).await?;

        let stored = index[0].embedding.len();
        if stored != query_vector.len() {
            return Err(AppError::Index(format!(
                "Query embedding has {} dimensions but the index uses {}. \
                 Clear the index and upload documents again after changing embedding models.",
                query_vector.len(),
                stored
            )));
        }

        let total = index.len();
        let ranked = rank(&query_vector, index, top_k);

        tracing::info!(
            "Retrieved {} of {} chunks (top score: {:.3})",
            ranked.len(),
            total,
            ranked.first().map(|c| c.score).unwrap_or(0.0)
        );

        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::mock::MockEmbeddingProvider;
    use crate::writer::IndexWriter;
    use tempfile::TempDir;

    fn scored(text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            record: ChunkRecord::new("f.txt", text, vec![1.0]),
            score,
        }
    }

    #[test]
    fn test_cosine_identical_and_opposite() {
        let v = [0.3, -1.2, 4.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);

        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&v, &neg) + 1.0).abs() < 1e-6);

        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_scores_zero() {
        let score = cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]);
        assert_eq!(score, 0.0);
        assert!(!score.is_nan());
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_stays_in_bounds() {
        let pairs = [
            (vec![1e-20f32, 3e-20], vec![2e-20f32, 6e-20]),
            (vec![1e20f32, -1e20], vec![-1e20f32, 1e20]),
            (vec![0.1f32; 1536], vec![0.1f32; 1536]),
        ];
        for (a, b) in pairs {
            let score = cosine_similarity(&a, &b);
            assert!((-1.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn test_clamp_top_k() {
        assert_eq!(clamp_top_k(0), 1);
        assert_eq!(clamp_top_k(-3), 1);
        assert_eq!(clamp_top_k(5), 5);
        assert_eq!(clamp_top_k(999), 10);
    }

    #[test]
    fn test_rank_sorts_descending_and_keeps_ties_stable() {
        let records = vec![
            ChunkRecord::new("a.txt", "orthogonal", vec![0.0, 1.0]),
            ChunkRecord::new("a.txt", "tie one", vec![1.0, 1.0]),
            ChunkRecord::new("b.txt", "exact", vec![1.0, 0.0]),
            ChunkRecord::new("b.txt", "tie two", vec![2.0, 2.0]),
        ];

        let ranked = rank(&[1.0, 0.0], records, 10);
        let texts: Vec<&str> = ranked.iter().map(|c| c.record.text.as_str()).collect();

        assert_eq!(texts, vec!["exact", "tie one", "tie two", "orthogonal"]);
    }

    #[test]
    fn test_rank_never_exceeds_index_size_or_ten() {
        let many: Vec<ChunkRecord> = (0..25)
            .map(|i| ChunkRecord::new("f.txt", format!("c{}", i), vec![i as f32, 1.0]))
            .collect();

        assert_eq!(rank(&[1.0, 1.0], many.clone(), 999).len(), 10);
        assert_eq!(rank(&[1.0, 1.0], many.clone(), 0).len(), 1);
        assert_eq!(rank(&[1.0, 1.0], many[..3].to_vec(), 999).len(), 3);
    }

    #[test]
    fn test_build_context_numbering() {
        let chunks = vec![scored("Alpha", 0.9), scored("Beta", 0.5)];
        assert_eq!(build_context(&chunks), "[[1]] Alpha\n\n[[2]] Beta");
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn test_build_context_truncates_to_budget() {
        let chunks: Vec<ScoredChunk> = (0..10).map(|_| scored(&"é".repeat(1500), 0.5)).collect();

        let context = build_context(&chunks);
        assert_eq!(context.chars().count(), CONTEXT_CHAR_BUDGET);
        assert!(context.starts_with("[[1]] "));
    }

    #[tokio::test]
    async fn test_retrieve_on_empty_index() {
        let temp = TempDir::new().unwrap();
        let retriever = Retriever::new(
            Arc::new(EmbeddingClient::new(
                Arc::new(MockEmbeddingProvider::new(32)),
                32,
                1,
            )),
            IndexStore::new(temp.path().join("index.json")),
        );

        let err = retriever.retrieve("anything", 5).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyIndex));
    }

    #[tokio::test]
    async fn test_retrieve_rejects_dimension_change() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::new(temp.path().join("index.json"));
        IndexWriter::spawn(store.clone())
            .append(vec![ChunkRecord::new("a.txt", "old model", vec![1.0; 8])])
            .await
            .unwrap();

        let retriever = Retriever::new(
            Arc::new(EmbeddingClient::new(
                Arc::new(MockEmbeddingProvider::new(32)),
                32,
                1,
            )),
            store,
        );

        let err = retriever.retrieve("question", 5).await.unwrap_err();
        assert!(matches!(err, AppError::Index(_)));
    }
}
