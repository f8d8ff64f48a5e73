use serde::{Deserialize, Serialize};

/// Region tag used in document metadata for policies that apply everywhere.
pub const NATIONWIDE: &str = "전국";

/// Placeholder region for documents whose source folder carried no region tag.
pub const REGION_UNKNOWN: &str = "지역미상";

/// Metadata attached to each policy document by the external
/// text-extraction/chunking collaborator. The core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub region: String,
    pub file_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<u32>,
}

impl DocumentMetadata {
    pub fn new(filename: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            region: region.into(),
            file_type: "pdf".to_owned(),
            chunk_id: None,
        }
    }
}

/// A single policy document (or chunk of one) as stored by the document
/// collaborator. Immutable from the core's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Dedup key used across expanded-query retrievals: the first
    /// `prefix_len` characters of content. Near-duplicates with only
    /// trailing differences collapse onto one key.
    pub fn content_prefix(&self, prefix_len: usize) -> String {
        self.content.chars().take(prefix_len).collect()
    }
}

/// Document annotated with retrieval scores. Created transiently during
/// ranking and discarded after response assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Semantic similarity reported by the nearest-neighbor provider.
    pub similarity: f32,
    /// Blended lexical/semantic score set by the reranker.
    pub rerank_score: f32,
    /// Region-priority boost set by the region reorder step.
    pub domain_boost: f32,
}

impl ScoredDocument {
    pub fn new(document: Document, similarity: f32) -> Self {
        Self {
            document,
            similarity,
            rerank_score: 0.0,
            domain_boost: 0.0,
        }
    }
}

/// Structured policy fields recovered from one document. Every field is
/// independently optional; an all-`None` value means the document had no
/// usable content and must be excluded from the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPolicy {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target: Option<String>,
    pub benefits: Option<String>,
    pub application: Option<String>,
}

impl ExtractedPolicy {
    pub fn has_any_field(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.target.is_some()
            || self.benefits.is_some()
            || self.application.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_prefix_truncates_by_chars_not_bytes() {
        let doc = Document::new("가나다라마바사", DocumentMetadata::new("a.pdf", NATIONWIDE));
        assert_eq!(doc.content_prefix(3), "가나다");
    }

    #[test]
    fn empty_policy_reports_no_fields() {
        let policy = ExtractedPolicy::default();
        assert!(!policy.has_any_field());

        let named = ExtractedPolicy {
            name: Some("기초연금".to_owned()),
            ..ExtractedPolicy::default()
        };
        assert!(named.has_any_field());
    }
}
