use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::ScoredDocument;

/// Question intent decided before any retrieval work happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    WelfareInquiry,
    CasualConversation,
    Irrelevant,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Intent::WelfareInquiry => "welfare_inquiry",
            Intent::CasualConversation => "casual_conversation",
            Intent::Irrelevant => "irrelevant",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One source attribution entry in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub filename: String,
    pub region: String,
    pub file_type: String,
}

/// The caller-facing response contract rendered by the out-of-scope web
/// layer. Field names and types must stay stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub intent: Intent,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_used: Option<usize>,
    /// Template-rendered answer captured before the generation service
    /// ran, kept for the validation/comparison flow. Identical to
    /// `answer_post_generation` whenever the service is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_pre_generation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_post_generation: Option<String>,
}

impl ChatResponse {
    pub fn new(answer: impl Into<String>, intent: Intent, confidence: Confidence) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            intent,
            confidence,
            method: None,
            context_used: None,
            answer_pre_generation: None,
            answer_post_generation: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}

/// Extracts deduplicated source attributions from ranked documents,
/// preserving ranking order.
pub fn extract_sources(documents: &[ScoredDocument]) -> Vec<SourceRef> {
    let mut sources = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for doc in documents {
        let meta = &doc.document.metadata;
        if seen.insert(meta.filename.clone()) {
            sources.push(SourceRef {
                filename: meta.filename.clone(),
                region: meta.region.clone(),
                file_type: meta.file_type.clone(),
            });
        }
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentMetadata};

    #[test]
    fn intent_serializes_snake_case() {
        let value = serde_json::to_string(&Intent::WelfareInquiry).unwrap();
        assert_eq!(value, "\"welfare_inquiry\"");
        assert_eq!(Intent::CasualConversation.to_string(), "casual_conversation");
    }

    #[test]
    fn sources_are_deduplicated_by_filename() {
        let doc = |filename: &str| {
            ScoredDocument::new(
                Document::new("내용", DocumentMetadata::new(filename, "서울")),
                0.5,
            )
        };
        let docs = vec![doc("a.pdf"), doc("b.pdf"), doc("a.pdf")];
        let sources = extract_sources(&docs);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].filename, "a.pdf");
        assert_eq!(sources[1].filename, "b.pdf");
    }
}
