//! Lexical reranking pass over vector-retrieved candidates.
//!
//! Scores each candidate with TF-IDF computed over the candidate set
//! itself (request-local document frequencies) and blends the lexical
//! score with the vector similarity carried on the candidate.

use std::collections::{HashMap, HashSet};

use common::document::ScoredDocument;
use tracing::debug;

use crate::tokenize::tokenize;

const SIMILARITY_WEIGHT: f32 = 0.7;
const LEXICAL_WEIGHT: f32 = 0.3;

#[derive(Debug, Default)]
pub struct LexicalReranker;

impl LexicalReranker {
    pub fn new() -> Self {
        Self
    }

    /// Reranks `candidates` against `query`, truncating to `top_k`.
    /// An empty candidate list comes back empty. The similarity carried
    /// on each candidate is taken as-is; a zero means "unrelated", not
    /// "unknown".
    pub fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<ScoredDocument>,
        top_k: usize,
    ) -> Vec<ScoredDocument> {
        if candidates.is_empty() {
            return candidates;
        }

        let query_tokens = tokenize(query);
        let doc_tokens: Vec<Vec<String>> = candidates
            .iter()
            .map(|candidate| tokenize(&candidate.document.content))
            .collect();
        let idf = inverse_document_frequencies(&doc_tokens);

        for (candidate, tokens) in candidates.iter_mut().zip(&doc_tokens) {
            let lexical = lexical_score(&query_tokens, tokens, &idf);
            candidate.rerank_score =
                SIMILARITY_WEIGHT * candidate.similarity + LEXICAL_WEIGHT * lexical.min(1.0);
        }

        candidates.sort_by(|a, b| {
            b.rerank_score
                .partial_cmp(&a.rerank_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(top_k);

        debug!(kept = candidates.len(), "reranked candidates");
        candidates
    }
}

/// Smoothed IDF over the candidate set: ln((N + 1) / (df + 1)).
/// Request-local on purpose; there is no corpus-wide statistic to
/// consult and the ranking only needs to separate these candidates.
fn inverse_document_frequencies(doc_tokens: &[Vec<String>]) -> HashMap<String, f32> {
    let total = doc_tokens.len() as f32;
    let mut document_counts: HashMap<String, usize> = HashMap::new();
    for tokens in doc_tokens {
        let unique: HashSet<&String> = tokens.iter().collect();
        for token in unique {
            *document_counts.entry(token.clone()).or_insert(0) += 1;
        }
    }
    document_counts
        .into_iter()
        .map(|(token, count)| (token, ((total + 1.0) / (count as f32 + 1.0)).ln()))
        .collect()
}

fn lexical_score(
    query_tokens: &[String],
    doc_tokens: &[String],
    idf: &HashMap<String, f32>,
) -> f32 {
    if doc_tokens.is_empty() || query_tokens.is_empty() {
        return 0.0;
    }
    let total = doc_tokens.len() as f32;
    let mut term_counts: HashMap<&String, usize> = HashMap::new();
    for token in doc_tokens {
        *term_counts.entry(token).or_insert(0) += 1;
    }
    query_tokens
        .iter()
        .map(|token| {
            let tf = term_counts.get(token).copied().unwrap_or(0) as f32 / total;
            tf * idf.get(token).copied().unwrap_or(0.0)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::document::{Document, DocumentMetadata};

    fn candidate(content: &str, similarity: f32) -> ScoredDocument {
        ScoredDocument::new(
            Document {
                content: content.to_string(),
                metadata: DocumentMetadata::new("test.pdf", "전국"),
            },
            similarity,
        )
    }

    #[test]
    fn empty_input_stays_empty() {
        let reranker = LexicalReranker::new();
        assert!(reranker.rerank("기초연금", Vec::new(), 5).is_empty());
    }

    #[test]
    fn query_term_overlap_outranks_unrelated_content() {
        let reranker = LexicalReranker::new();
        let candidates = vec![
            candidate("청소년 프로그램 운영 안내", 0.5),
            candidate("기초연금 수급 자격 및 기초연금 신청 방법", 0.5),
        ];
        let ranked = reranker.rerank("기초연금 신청", candidates, 5);
        assert!(ranked[0].document.content.contains("기초연금"));
        assert!(ranked[0].rerank_score > ranked[1].rerank_score);
    }

    #[test]
    fn zero_similarity_earns_no_baseline_score() {
        let reranker = LexicalReranker::new();
        let candidates = vec![
            candidate("경로당 난방비 지원 사업 운영 안내", 0.0),
            candidate("기초연금 지원대상: 만 65세 이상 어르신에게 매월 기초연금 지급", 0.43),
        ];
        let ranked = reranker.rerank("기초연금 신청", candidates, 5);
        // The orthogonal document has no similarity and no query-token
        // overlap, so it must not outrank the related one.
        assert!(ranked[0].document.content.contains("기초연금"));
        assert!(ranked[1].rerank_score <= f32::EPSILON);
    }

    #[test]
    fn result_is_truncated_to_top_k() {
        let reranker = LexicalReranker::new();
        let candidates = (0..6)
            .map(|i| candidate(&format!("노인 복지 문서 {i}"), 0.4))
            .collect();
        assert_eq!(reranker.rerank("노인 복지", candidates, 3).len(), 3);
    }

    #[test]
    fn high_similarity_still_dominates_without_lexical_overlap() {
        let reranker = LexicalReranker::new();
        let candidates = vec![
            candidate("요양 시설 이용 안내", 0.95),
            candidate("전혀 다른 주제", 0.2),
        ];
        let ranked = reranker.rerank("무관한 질의어", candidates, 5);
        assert!(ranked[0].document.content.contains("요양"));
    }
}
