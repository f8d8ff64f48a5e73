//! Vector retrieval seam. The pipeline only sees this trait, so the
//! backing store can be a real vector database or the in-memory scan
//! used by the CLI and tests.

use async_trait::async_trait;
use common::document::Document;
use common::error::AppError;

#[derive(Debug, Clone)]
pub struct SimilarDocument {
    pub document: Document,
    pub similarity: f32,
}

#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Returns up to `k` documents most similar to `embedding`, best
    /// first.
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<SimilarDocument>, AppError>;
}

/// Brute-force cosine scan over pre-embedded documents.
pub struct InMemoryRetriever {
    entries: Vec<(Document, Vec<f32>)>,
}

impl InMemoryRetriever {
    pub fn new(entries: Vec<(Document, Vec<f32>)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl DocumentRetriever for InMemoryRetriever {
    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<SimilarDocument>, AppError> {
        let mut scored: Vec<SimilarDocument> = self
            .entries
            .iter()
            .map(|(document, stored)| SimilarDocument {
                document: document.clone(),
                similarity: cosine_similarity(embedding, stored),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::document::DocumentMetadata;

    fn doc(content: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: DocumentMetadata::new("doc.pdf", "전국"),
        }
    }

    #[test]
    fn cosine_handles_degenerate_input() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn search_returns_best_first_and_truncates() {
        let retriever = InMemoryRetriever::new(vec![
            (doc("a"), vec![1.0, 0.0]),
            (doc("b"), vec![0.0, 1.0]),
            (doc("c"), vec![0.7, 0.7]),
        ]);
        let results = retriever.search(&[1.0, 0.0], 2).await.expect("search");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "a");
        assert_eq!(results[1].document.content, "c");
    }
}
