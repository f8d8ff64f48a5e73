//! Retrieval and answer-synthesis core for the elderly-welfare policy
//! assistant: intent gating, query expansion, multi-query vector
//! search with lexical reranking, policy field extraction, and
//! template or generation-backed answers.

pub mod expansion;
pub mod extraction;
pub mod intent;
pub mod pipeline;
pub mod region;
pub mod reranking;
pub mod retriever;
pub mod service;
pub mod synthesis;
pub mod tokenize;

pub use pipeline::{run_pipeline, PipelineOutcome, PipelineTuning};
pub use retriever::{DocumentRetriever, InMemoryRetriever, SimilarDocument};
pub use service::WelfareRagService;
pub use synthesis::{GenerationClient, OpenAiGeneration, TemplateSynthesizer};
