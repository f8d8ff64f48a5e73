//! Turns an extracted policy into the markdown block shown in answers,
//! with a relevance gate so documents about a different program than
//! the one asked about are dropped instead of padding the answer.

use common::document::Document;
use tracing::debug;

use super::metadata::{find_policy_metadata, DEFAULT_POLICY_URL};
use super::PolicyExtractor;
use crate::tokenize::question_keywords;

const FALLBACK_POLICY_NAME: &str = "복지 정책";

/// Question-term synonym groups checked against policy names. When the
/// question names one of these programs, a policy whose name matches
/// none of the group's terms is irrelevant.
const SYNONYM_GROUPS: &[(&str, &[&str])] = &[
    ("기초연금", &["기초연금", "노령연금"]),
    ("의료급여", &["의료급여", "의료지원", "의료비"]),
    ("장기요양", &["장기요양", "요양", "돌봄"]),
    ("일자리", &["일자리", "취업", "근로"]),
    ("보훈", &["보훈", "유공자", "참전"]),
    ("건강", &["건강", "의료", "진료"]),
];

#[derive(Debug, Clone)]
pub struct FormattedPolicy {
    pub formatted_text: String,
    pub filename: String,
    pub region: String,
    pub policy_name: String,
    pub policy_url: String,
}

#[derive(Default)]
pub struct PolicyFormatter {
    extractor: PolicyExtractor,
}

impl PolicyFormatter {
    pub fn new() -> Self {
        Self {
            extractor: PolicyExtractor::new(),
        }
    }

    /// Formats one document as a policy block. Returns `None` when the
    /// document yields no usable fields or its policy is unrelated to
    /// the question.
    pub fn format_document(&self, document: &Document, question: &str) -> Option<FormattedPolicy> {
        let meta = find_policy_metadata(&document.content, &document.metadata.filename);
        let policy = self.extractor.extract(&document.content, question);

        let policy_name = meta
            .map(|m| m.name.to_string())
            .or_else(|| policy.name.clone())
            .unwrap_or_else(|| FALLBACK_POLICY_NAME.to_string());
        let policy_url = meta
            .map(|m| m.url.to_string())
            .unwrap_or_else(|| DEFAULT_POLICY_URL.to_string());

        if !question.is_empty() && !is_policy_relevant(&policy_name, question) {
            debug!(policy = %policy_name, "policy filtered as unrelated to the question");
            return None;
        }

        // A metadata hit alone is enough to name the policy, but with
        // no extracted fields either there is nothing to show.
        if !policy.has_any_field() && meta.is_none() {
            return None;
        }

        let description = policy.description.unwrap_or_default();
        let target = policy.target.unwrap_or_default();
        let mut benefits = policy.benefits.unwrap_or_default();
        let application = policy.application.unwrap_or_default();

        // Near-duplicate description and benefits read as stuttering.
        if !description.is_empty()
            && !benefits.is_empty()
            && (description.contains(&benefits) || benefits.contains(&description))
        {
            benefits.clear();
        }

        let mut text = format!("**📋 {policy_name}**\n");
        if !description.is_empty() {
            text.push_str(&format!("• **설명**: {description}\n"));
        }
        if !target.is_empty() {
            text.push_str(&format!("• **대상**: {target}\n"));
        }
        if !benefits.is_empty() {
            text.push_str(&format!("• **혜택**: {benefits}\n"));
        }
        if !application.is_empty() {
            text.push_str(&format!("• **신청**: {application}\n"));
        }
        text.push_str(&format!(
            "• **출처**: [{filename}]({policy_url}) ({region})",
            filename = document.metadata.filename,
            region = document.metadata.region,
        ));

        Some(FormattedPolicy {
            formatted_text: text,
            filename: document.metadata.filename.clone(),
            region: document.metadata.region.clone(),
            policy_name,
            policy_url,
        })
    }
}

/// Keyword gate between a question and a policy name. Direct keyword
/// hits pass; a synonym group named in the question excludes policies
/// matching none of the group's terms; general welfare questions pass
/// everything.
fn is_policy_relevant(policy_name: &str, question: &str) -> bool {
    let keywords = question_keywords(question);
    let extra_stopwords = ["대해", "정책", "복지"];
    let keywords: Vec<&String> = keywords
        .iter()
        .filter(|kw| !extra_stopwords.contains(&kw.as_str()))
        .collect();

    if keywords
        .iter()
        .any(|keyword| policy_name.contains(keyword.as_str()))
    {
        return true;
    }

    let question_lower = question.to_lowercase();
    let policy_lower = policy_name.to_lowercase();
    for (trigger, synonyms) in SYNONYM_GROUPS {
        if question_lower.contains(trigger) {
            if synonyms.iter().any(|syn| policy_lower.contains(syn)) {
                return true;
            }
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::document::DocumentMetadata;

    fn document(content: &str, filename: &str, region: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: DocumentMetadata::new(filename, region),
        }
    }

    const PENSION_CHUNK: &str = "\
어르신의 안정적인 노후 생활을 지원하기 위하여 매월 기초연금을 지급하는 제도입니다
지원대상: 만 65세 이상이며 소득인정액이 선정기준액 이하인 어르신 가구
지원내용: 매월 최대 334,810원의 기초연금을 지급하며 부부가구는 감액 적용
신청방법: 주소지 관할 주민센터 방문 신청 또는 복지로 온라인 접수 가능";

    #[test]
    fn formats_a_policy_block_with_source_line() {
        let formatter = PolicyFormatter::new();
        let doc = document(PENSION_CHUNK, "기초연금_안내.pdf", "전국");
        let formatted = formatter
            .format_document(&doc, "기초연금 얼마나 받을 수 있나요")
            .expect("policy block");

        assert_eq!(formatted.policy_name, "기초연금");
        assert!(formatted.formatted_text.starts_with("**📋 기초연금**"));
        assert!(formatted.formatted_text.contains("• **대상**:"));
        assert!(formatted.formatted_text.contains("• **혜택**:"));
        assert!(formatted
            .formatted_text
            .contains("[기초연금_안내.pdf]"));
        assert!(formatted.formatted_text.ends_with("(전국)"));
    }

    #[test]
    fn unrelated_policy_is_filtered() {
        let formatter = PolicyFormatter::new();
        let doc = document(
            "지원내용: 경로당 난방비를 월 40만원 한도로 지원",
            "경로당_운영.pdf",
            "경북",
        );
        // Metadata resolves this to 경로당 운영; a 기초연금 question
        // must not surface it.
        assert!(formatter
            .format_document(&doc, "기초연금 수급 자격")
            .is_none());
    }

    #[test]
    fn empty_extraction_without_metadata_yields_none() {
        let formatter = PolicyFormatter::new();
        let doc = document("행사 일정 공지", "공지.pdf", "서울");
        assert!(formatter.format_document(&doc, "").is_none());
    }

    #[test]
    fn general_questions_pass_the_relevance_gate() {
        assert!(is_policy_relevant("노인맞춤돌봄서비스", "어르신 복지 혜택 알려주세요"));
    }

    #[test]
    fn synonym_group_matches_related_names() {
        assert!(is_policy_relevant("노인장기요양보험", "장기요양 등급 신청"));
        assert!(!is_policy_relevant("경로당 운영", "기초연금 신청"));
    }
}
