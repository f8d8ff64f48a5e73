//! Query expansion. Produces lexical variants of the question so that
//! retrieval can catch documents phrased with synonyms ("노인" vs
//! "어르신") or with narrower program terms ("연금" vs "기초연금").

use tracing::debug;

/// Ordered synonym table. Order matters: the first two synonyms of
/// each row are the ones swapped in, and output order is
/// deterministic.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("노인", &["어르신", "고령자", "시니어"]),
    ("어르신", &["노인", "고령자"]),
    ("복지", &["지원", "혜택", "서비스"]),
    ("혜택", &["복지", "지원", "서비스"]),
    ("지원", &["복지", "혜택", "보조"]),
    ("신청", &["접수", "등록"]),
    ("방법", &["절차", "과정"]),
    ("연금", &["기초연금", "노령연금"]),
    ("의료", &["건강", "진료"]),
    ("돌봄", &["요양", "간병"]),
    ("할인", &["감면", "우대"]),
    ("수당", &["급여", "지원금"]),
    ("일자리", &["취업", "근로"]),
];

/// Suffix expansions appended when the question mentions the trigger
/// term, to pull in procedural chunks.
const EXPANSION_SUFFIXES: &[(&str, &str)] = &[
    ("연금", "수급 자격"),
    ("의료비", "지원 대상"),
    ("돌봄", "서비스 신청"),
    ("할인", "경로우대 혜택"),
];

const MAX_SWAPS_PER_TERM: usize = 2;
const MAX_EXPANSIONS: usize = 5;

#[derive(Debug, Default)]
pub struct QueryExpander;

impl QueryExpander {
    pub fn new() -> Self {
        Self
    }

    /// Expands a question into at most [`MAX_EXPANSIONS`] variants.
    /// The original question is always first; each matched term
    /// contributes up to two synonym swaps and one suffix variant;
    /// duplicates are dropped while preserving first-seen order.
    pub fn expand(&self, question: &str) -> Vec<String> {
        let mut variants = vec![question.to_string()];

        for (term, replacements) in SYNONYMS {
            if !question.contains(term) {
                continue;
            }
            for replacement in replacements.iter().take(MAX_SWAPS_PER_TERM) {
                variants.push(question.replace(term, replacement));
            }
        }

        // One suffix per matched trigger; the table carries exactly one
        // suffix per row.
        for (trigger, suffix) in EXPANSION_SUFFIXES {
            if question.contains(trigger) {
                variants.push(format!("{question} {suffix}"));
            }
        }

        let deduped = dedup_preserving_order(variants);
        let expansions: Vec<String> = deduped.into_iter().take(MAX_EXPANSIONS).collect();
        debug!(count = expansions.len(), "expanded query");
        expansions
    }
}

fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
