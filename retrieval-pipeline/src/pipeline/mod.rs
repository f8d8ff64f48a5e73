//! Multi-query retrieval pipeline: expand the question, search each
//! variant, deduplicate, rerank against the original question.

mod config;
mod stages;

pub use config::PipelineTuning;
pub use stages::PipelineContext;

use async_trait::async_trait;
use common::{document::ScoredDocument, error::AppError, utils::embedding::EmbeddingProvider};
use std::time::{Duration, Instant};
use tracing::info;

use crate::retriever::DocumentRetriever;
use crate::synthesis::TemplateSynthesizer;
use stages::{ExpandStage, RerankStage, SearchStage};

pub const METHOD_ADVANCED_RAG: &str = "advanced_rag";
pub const METHOD_NO_DOCUMENTS: &str = "advanced_rag_no_docs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Expand,
    Search,
    Rerank,
}

#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn kind(&self) -> StageKind;
    async fn execute(&self, ctx: &mut PipelineContext<'_>) -> Result<(), AppError>;
}

pub type BoxedStage = Box<dyn PipelineStage>;

#[derive(Debug, Default, Clone)]
pub struct PipelineStageTimings {
    timings: Vec<(StageKind, Duration)>,
}

impl PipelineStageTimings {
    pub fn record(&mut self, kind: StageKind, duration: Duration) {
        self.timings.push((kind, duration));
    }

    pub fn into_vec(self) -> Vec<(StageKind, Duration)> {
        self.timings
    }

    fn get_stage_ms(&self, kind: StageKind) -> u128 {
        self.timings
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, d)| d.as_millis())
            .unwrap_or(0)
    }

    pub fn expand_ms(&self) -> u128 {
        self.get_stage_ms(StageKind::Expand)
    }

    pub fn search_ms(&self) -> u128 {
        self.get_stage_ms(StageKind::Search)
    }

    pub fn rerank_ms(&self) -> u128 {
        self.get_stage_ms(StageKind::Rerank)
    }
}

/// What the retrieval run produced. `method` distinguishes a grounded
/// answer from the nothing-found path so callers and response payloads
/// can tell them apart.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Categorized template answer assembled from the ranked
    /// documents; callers with richer synthesis replace it.
    pub answer: String,
    pub documents: Vec<ScoredDocument>,
    pub method: &'static str,
    pub stage_timings: PipelineStageTimings,
}

impl PipelineOutcome {
    pub fn found_documents(&self) -> bool {
        !self.documents.is_empty()
    }
}

fn stages() -> Vec<BoxedStage> {
    vec![
        Box::new(ExpandStage::new()),
        Box::new(SearchStage),
        Box::new(RerankStage::new()),
    ]
}

pub async fn run_pipeline(
    retriever: &dyn DocumentRetriever,
    embedder: &EmbeddingProvider,
    question: &str,
    tuning: PipelineTuning,
) -> Result<PipelineOutcome, AppError> {
    let question_chars = question.chars().count();
    info!(question_chars, top_k = tuning.top_k, "starting retrieval pipeline");

    let mut ctx = PipelineContext::new(retriever, embedder, question.to_owned(), tuning);

    for stage in stages() {
        let start = Instant::now();
        stage.execute(&mut ctx).await?;
        ctx.record_stage_duration(stage.kind(), start.elapsed());
    }

    let stage_timings = ctx.take_stage_timings();
    let documents = ctx.reranked;
    let (answer, method) = if documents.is_empty() {
        (no_documents_answer(question), METHOD_NO_DOCUMENTS)
    } else {
        let answer = TemplateSynthesizer::new().synthesize_categorized(question, &documents);
        (answer, METHOD_ADVANCED_RAG)
    };

    info!(
        documents = documents.len(),
        method,
        expand_ms = stage_timings.expand_ms(),
        search_ms = stage_timings.search_ms(),
        rerank_ms = stage_timings.rerank_ms(),
        "retrieval pipeline finished"
    );

    Ok(PipelineOutcome {
        answer,
        documents,
        method,
        stage_timings,
    })
}

/// Canned answer for the nothing-found path.
pub fn no_documents_answer(question: &str) -> String {
    format!("'{question}'에 대한 정보를 찾지 못했습니다.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::InMemoryRetriever;
    use common::document::{Document, DocumentMetadata};

    fn doc(content: &str, region: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: DocumentMetadata::new("doc.pdf", region),
        }
    }

    async fn embed(provider: &EmbeddingProvider, text: &str) -> Vec<f32> {
        provider.embed(text).await.expect("hashed embedding")
    }

    #[tokio::test]
    async fn pipeline_returns_deduplicated_reranked_documents() {
        let embedder = EmbeddingProvider::new_hashed(256);
        let pension = doc(
            "기초연금 지원대상: 만 65세 이상 어르신에게 매월 기초연금 지급",
            "전국",
        );
        let unrelated = doc("경로당 난방비 지원 사업 운영 안내", "경북");
        let entries = vec![
            (pension.clone(), embed(&embedder, &pension.content).await),
            (unrelated.clone(), embed(&embedder, &unrelated.content).await),
        ];
        let retriever = InMemoryRetriever::new(entries);

        let outcome = run_pipeline(
            &retriever,
            &embedder,
            "기초연금 신청",
            PipelineTuning::default(),
        )
        .await
        .expect("pipeline run");

        assert_eq!(outcome.method, METHOD_ADVANCED_RAG);
        // Several expansions hit the same two stored documents; dedup
        // must collapse them back to two.
        assert_eq!(outcome.documents.len(), 2);
        assert!(outcome.documents[0].document.content.contains("기초연금"));
        assert!(outcome.answer.contains("💡 **추가 문의**"));
    }

    #[tokio::test]
    async fn empty_store_takes_the_no_documents_path() {
        let embedder = EmbeddingProvider::new_hashed(256);
        let retriever = InMemoryRetriever::new(Vec::new());

        let outcome = run_pipeline(
            &retriever,
            &embedder,
            "기초연금 신청",
            PipelineTuning::default(),
        )
        .await
        .expect("pipeline run");

        assert_eq!(outcome.method, METHOD_NO_DOCUMENTS);
        assert!(!outcome.found_documents());
        assert!(outcome.answer.contains("기초연금 신청"));
        assert!(outcome.answer.contains("찾지 못했습니다"));
    }

    struct FlakyRetriever {
        inner: InMemoryRetriever,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl DocumentRetriever for FlakyRetriever {
        async fn search(
            &self,
            embedding: &[f32],
            k: usize,
        ) -> Result<Vec<crate::retriever::SimilarDocument>, AppError> {
            let call = self
                .calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call == 0 {
                return Err(AppError::Retrieval("index temporarily unavailable".into()));
            }
            self.inner.search(embedding, k).await
        }
    }

    #[tokio::test]
    async fn one_failing_expansion_does_not_sink_the_run() {
        let embedder = EmbeddingProvider::new_hashed(256);
        let pension = doc("기초연금 지원대상 안내와 신청 방법", "전국");
        let entries = vec![(pension.clone(), embed(&embedder, &pension.content).await)];
        let retriever = FlakyRetriever {
            inner: InMemoryRetriever::new(entries),
            calls: std::sync::atomic::AtomicUsize::new(0),
        };

        // First expansion's search errors; later expansions must still
        // deliver the document.
        let outcome = run_pipeline(
            &retriever,
            &embedder,
            "기초연금 신청",
            PipelineTuning::default(),
        )
        .await
        .expect("pipeline run");

        assert_eq!(outcome.method, METHOD_ADVANCED_RAG);
        assert_eq!(outcome.documents.len(), 1);
    }

    #[tokio::test]
    async fn top_k_bounds_the_result() {
        let embedder = EmbeddingProvider::new_hashed(256);
        let mut entries = Vec::new();
        for i in 0..8 {
            let d = doc(&format!("노인 복지 지원 정책 안내 문서 {i}"), "서울");
            let e = embed(&embedder, &d.content).await;
            entries.push((d, e));
        }
        let retriever = InMemoryRetriever::new(entries);

        let outcome = run_pipeline(
            &retriever,
            &embedder,
            "노인 복지",
            PipelineTuning::with_top_k(3),
        )
        .await
        .expect("pipeline run");

        assert_eq!(outcome.documents.len(), 3);
    }
}
