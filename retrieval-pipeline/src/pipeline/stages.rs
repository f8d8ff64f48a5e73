use std::collections::HashSet;

use async_trait::async_trait;
use common::{document::ScoredDocument, error::AppError, utils::embedding::EmbeddingProvider};
use tracing::{debug, warn};

use crate::{
    expansion::QueryExpander, reranking::LexicalReranker, retriever::DocumentRetriever,
};

use super::{config::PipelineTuning, PipelineStage, PipelineStageTimings, StageKind};

pub struct PipelineContext<'a> {
    pub retriever: &'a dyn DocumentRetriever,
    pub embedder: &'a EmbeddingProvider,
    pub question: String,
    pub tuning: PipelineTuning,
    pub expanded_queries: Vec<String>,
    pub candidates: Vec<ScoredDocument>,
    pub reranked: Vec<ScoredDocument>,
    seen_prefixes: HashSet<String>,
    stage_timings: PipelineStageTimings,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        retriever: &'a dyn DocumentRetriever,
        embedder: &'a EmbeddingProvider,
        question: String,
        tuning: PipelineTuning,
    ) -> Self {
        Self {
            retriever,
            embedder,
            question,
            tuning,
            expanded_queries: Vec::new(),
            candidates: Vec::new(),
            reranked: Vec::new(),
            seen_prefixes: HashSet::new(),
            stage_timings: PipelineStageTimings::default(),
        }
    }

    /// Admits a candidate unless a document with the same content
    /// prefix was already collected by an earlier expansion. First
    /// occurrence wins.
    pub fn admit_candidate(&mut self, candidate: ScoredDocument) {
        let prefix = candidate
            .document
            .content_prefix(self.tuning.dedup_prefix_chars);
        if self.seen_prefixes.insert(prefix) {
            self.candidates.push(candidate);
        }
    }

    pub fn record_stage_duration(&mut self, kind: StageKind, duration: std::time::Duration) {
        self.stage_timings.record(kind, duration);
    }

    pub fn take_stage_timings(&mut self) -> PipelineStageTimings {
        std::mem::take(&mut self.stage_timings)
    }
}

/// Produces the query variants searched in the next stage.
pub struct ExpandStage {
    expander: QueryExpander,
}

impl ExpandStage {
    pub fn new() -> Self {
        Self {
            expander: QueryExpander::new(),
        }
    }
}

impl Default for ExpandStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStage for ExpandStage {
    fn kind(&self) -> StageKind {
        StageKind::Expand
    }

    async fn execute(&self, ctx: &mut PipelineContext<'_>) -> Result<(), AppError> {
        let mut queries = self.expander.expand(&ctx.question);
        queries.truncate(ctx.tuning.max_expansions);
        debug!(expansions = queries.len(), "query expansion complete");
        ctx.expanded_queries = queries;
        Ok(())
    }
}

/// Embeds each expansion and collects deduplicated candidates. A
/// failing expansion is logged and skipped; when every expansion
/// fails the candidate set is simply empty, which downstream treats
/// the same as "no relevant documents".
pub struct SearchStage;

#[async_trait]
impl PipelineStage for SearchStage {
    fn kind(&self) -> StageKind {
        StageKind::Search
    }

    async fn execute(&self, ctx: &mut PipelineContext<'_>) -> Result<(), AppError> {
        let fetch = ctx.tuning.fetch_size();
        let queries = ctx.expanded_queries.clone();

        for query in &queries {
            let embedding = match ctx.embedder.embed(query).await {
                Ok(embedding) => embedding,
                Err(error) => {
                    warn!(%query, %error, "embedding failed for expansion, skipping");
                    continue;
                }
            };
            let results = match ctx.retriever.search(&embedding, fetch).await {
                Ok(results) => results,
                Err(error) => {
                    warn!(%query, %error, "search failed for expansion, skipping");
                    continue;
                }
            };
            for result in results {
                ctx.admit_candidate(ScoredDocument::new(result.document, result.similarity));
            }
        }

        debug!(candidates = ctx.candidates.len(), "candidate collection complete");
        Ok(())
    }
}

/// Reranks candidates against the original question, not the
/// expansions, so synonym variants cannot drag in off-topic chunks.
pub struct RerankStage {
    reranker: LexicalReranker,
}

impl RerankStage {
    pub fn new() -> Self {
        Self {
            reranker: LexicalReranker::new(),
        }
    }
}

impl Default for RerankStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStage for RerankStage {
    fn kind(&self) -> StageKind {
        StageKind::Rerank
    }

    async fn execute(&self, ctx: &mut PipelineContext<'_>) -> Result<(), AppError> {
        let candidates = std::mem::take(&mut ctx.candidates);
        ctx.reranked = self
            .reranker
            .rerank(&ctx.question, candidates, ctx.tuning.top_k);
        Ok(())
    }
}
