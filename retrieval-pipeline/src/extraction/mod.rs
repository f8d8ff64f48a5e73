//! Structured policy field extraction from document chunks.

pub mod formatter;
pub mod metadata;
mod rules;

use std::sync::OnceLock;

use common::document::ExtractedPolicy;
use regex::Regex;

use crate::tokenize::question_keywords;
use rules::{
    application_rules, benefit_rules, description_length_bonus, description_rules, target_rules,
    CategoryRules, LineFilters,
};

const MIN_LINE_CHARS: usize = 20;

fn bracket_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"「([^」]{3,40})」").expect("valid name pattern"))
}

fn numbered_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[.)]\s*(.+)").expect("valid name pattern"))
}

/// Extracts name, description, target, benefits, and application info
/// from one document chunk. Scoring picks the single best line per
/// category, so the output never concatenates unrelated sentences.
pub struct PolicyExtractor {
    filters: LineFilters,
    target: CategoryRules,
    benefit: CategoryRules,
    application: CategoryRules,
    description: CategoryRules,
}

impl Default for PolicyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyExtractor {
    pub fn new() -> Self {
        Self {
            filters: LineFilters::new(),
            target: target_rules(),
            benefit: benefit_rules(),
            application: application_rules(),
            description: description_rules(),
        }
    }

    pub fn extract(&self, text: &str, question: &str) -> ExtractedPolicy {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let keywords = question_keywords(question);

        let mut target_best: Option<(String, f32)> = None;
        let mut benefit_best: Option<(String, f32)> = None;
        let mut application_best: Option<(String, f32)> = None;
        let mut description_best: Option<(String, f32)> = None;

        for line in &lines {
            if line.chars().count() < MIN_LINE_CHARS
                || self.filters.is_junk(line)
                || self.filters.is_pure_law_reference(line)
                || self.filters.is_government_contact(line)
            {
                continue;
            }

            let cleaned = clean_sentence(line);

            if self.target.is_member(line) {
                keep_best(&mut target_best, &cleaned, self.target.score(&cleaned));
            }
            if self.benefit.is_member(line) {
                keep_best(&mut benefit_best, &cleaned, self.benefit.score(&cleaned));
            }
            if self.application.is_member(line) {
                keep_best(
                    &mut application_best,
                    &cleaned,
                    self.application.score(&cleaned),
                );
            }
            if is_description_line(line, &keywords) {
                let mut score = self.description.score(&cleaned);
                score += keywords
                    .iter()
                    .filter(|keyword| cleaned.contains(keyword.as_str()))
                    .count() as f32
                    * 2.5;
                score += description_length_bonus(&cleaned);
                keep_best(&mut description_best, &cleaned, score);
            }
        }

        ExtractedPolicy {
            name: self.find_policy_name(&lines),
            description: description_best.map(|(line, _)| truncate_chars(&line, self.description.max_chars)),
            target: target_best.map(|(line, _)| truncate_chars(&line, self.target.max_chars)),
            benefits: benefit_best.map(|(line, _)| truncate_chars(&line, self.benefit.max_chars)),
            application: application_best
                .map(|(line, _)| truncate_chars(&line, self.application.max_chars)),
        }
    }

    /// Policy name resolution over the first ten lines: a 「…」 title
    /// that is not a statute, a numbered heading carrying a program
    /// keyword, or a short welfare line.
    fn find_policy_name(&self, lines: &[&str]) -> Option<String> {
        const PROGRAM_KEYWORDS: &[&str] =
            &["사업", "지원", "서비스", "제도", "급여", "연금", "수당"];
        const WELFARE_KEYWORDS: &[&str] = &["노인", "어르신", "경로", "장기요양", "기초연금"];

        for line in lines.iter().take(10) {
            if let Some(captures) = bracket_name_re().captures(line) {
                let name = &captures[1];
                let is_statute =
                    name.contains("법률") || name.chars().next_back() == Some('법');
                if !is_statute {
                    return Some(name.to_string());
                }
            }

            if let Some(captures) = numbered_name_re().captures(line) {
                let name = captures[1].trim();
                let chars = name.chars().count();
                if (5..=50).contains(&chars)
                    && PROGRAM_KEYWORDS.iter().any(|kw| name.contains(kw))
                {
                    return Some(name.to_string());
                }
            }

            let chars = line.chars().count();
            if (5..=50).contains(&chars)
                && WELFARE_KEYWORDS.iter().any(|kw| line.contains(kw))
                && PROGRAM_KEYWORDS.iter().any(|kw| line.contains(kw))
            {
                return Some((*line).to_string());
            }
        }

        None
    }
}

fn is_description_line(line: &str, keywords: &[String]) -> bool {
    if !keywords.is_empty() && keywords.iter().any(|keyword| line.contains(keyword.as_str())) {
        return true;
    }

    const WELFARE: &[&str] = &[
        "노인", "어르신", "대상", "혜택", "복지", "급여", "지원", "제공", "고령자",
    ];
    const EXPLANATORY: &[&str] = &[
        "지원",
        "제공",
        "실시",
        "운영",
        "위한",
        "위해",
        "목적",
        "사업",
        "서비스",
        "프로그램",
    ];

    WELFARE.iter().any(|kw| line.contains(kw))
        && EXPLANATORY.iter().any(|kw| line.contains(kw))
}

fn keep_best(best: &mut Option<(String, f32)>, line: &str, score: f32) {
    if score <= 0.0 {
        return;
    }
    // Strictly greater, so the first line seen wins a tie.
    if best.as_ref().map_or(true, |(_, current)| score > *current) {
        *best = Some((line.to_string(), score));
    }
}

/// Strips leading bullets and collapses whitespace. Korean middle dot
/// lists become plain space-separated terms.
fn clean_sentence(sentence: &str) -> String {
    static BULLET_RE: OnceLock<Regex> = OnceLock::new();
    let bullet = BULLET_RE
        .get_or_init(|| Regex::new(r"^[○●■□◇◆▶▷•\-※]\s*").expect("valid bullet pattern"));

    let without_bullet = bullet.replace(sentence, "");
    let spaced = without_bullet.replace('ㆍ', " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
기초연금 지원 제도 안내
「노인복지법」 제26조에 따른 경로우대
어르신의 안정적인 노후 생활을 지원하기 위하여 매월 기초연금을 지급하는 제도입니다
지원대상: 만 65세 이상이며 소득인정액이 선정기준액 이하인 어르신 가구
지원내용: 매월 최대 334,810원의 기초연금을 지급하며 부부가구는 감액 적용
신청방법: 주소지 관할 주민센터 방문 신청 또는 복지로 온라인 접수 가능
보건복지부 기초연금정책과 (총괄) 044-202-3670";

    #[test]
    fn extracts_all_four_fields() {
        let extractor = PolicyExtractor::new();
        let policy = extractor.extract(SAMPLE, "기초연금 신청 방법");

        assert_eq!(policy.name.as_deref(), Some("기초연금 지원 제도 안내"));
        assert!(policy.target.as_deref().is_some_and(|t| t.contains("만 65세")));
        assert!(policy
            .benefits
            .as_deref()
            .is_some_and(|b| b.contains("334,810원")));
        assert!(policy
            .application
            .as_deref()
            .is_some_and(|a| a.contains("주민센터")));
        assert!(policy.description.is_some());
    }

    #[test]
    fn statute_and_contact_lines_never_surface() {
        let extractor = PolicyExtractor::new();
        let policy = extractor.extract(SAMPLE, "");
        for field in [
            policy.description.as_deref(),
            policy.target.as_deref(),
            policy.benefits.as_deref(),
            policy.application.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            assert!(!field.contains("노인복지법"));
            assert!(!field.contains("보건복지부"));
        }
    }

    #[test]
    fn nothing_is_fabricated_from_unrelated_text() {
        let extractor = PolicyExtractor::new();
        let policy = extractor.extract("오늘 점심 메뉴 공지", "기초연금");
        assert!(!policy.has_any_field());
        assert!(policy.name.is_none());
    }

    #[test]
    fn statute_title_is_not_a_policy_name() {
        let extractor = PolicyExtractor::new();
        let policy = extractor.extract("「노인장기요양보험법」 안내문\n본문 내용 없음", "");
        assert!(policy.name.is_none());
    }

    #[test]
    fn numbered_heading_becomes_the_name() {
        let extractor = PolicyExtractor::new();
        let policy = extractor.extract("1. 노인맞춤돌봄서비스 사업\n본문", "");
        assert_eq!(policy.name.as_deref(), Some("노인맞춤돌봄서비스 사업"));
    }

    #[test]
    fn bullets_are_stripped_from_extracted_lines() {
        let extractor = PolicyExtractor::new();
        let text = "○ 지원대상: 만 65세 이상 기초연금 수급 어르신으로 거동이 불편하신 분";
        let policy = extractor.extract(text, "");
        assert!(policy
            .target
            .as_deref()
            .is_some_and(|t| t.starts_with("지원대상")));
    }

    #[test]
    fn every_field_is_a_substring_of_a_normalized_source_line() {
        let extractor = PolicyExtractor::new();
        let policy = extractor.extract(SAMPLE, "기초연금 신청 방법");
        let normalized: Vec<String> = SAMPLE.lines().map(clean_sentence).collect();

        for field in [
            policy.description.as_deref(),
            policy.target.as_deref(),
            policy.benefits.as_deref(),
            policy.application.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            assert!(
                normalized.iter().any(|line| line.contains(field)),
                "field not grounded in source: {field}"
            );
        }
    }

    #[test]
    fn fields_are_capped() {
        let extractor = PolicyExtractor::new();
        let long_line = format!("지원대상: 만 65세 이상 어르신 {}", "가구 소득 기준 ".repeat(40));
        let policy = extractor.extract(&long_line, "");
        assert!(policy.target.is_some_and(|t| t.chars().count() <= 200));
    }
}
