//! Shared tokenization for the lexical reranker and the field extractor.
//!
//! Tokens are runs of Korean syllables, Latin letters, or digits, at
//! least two characters long, lowercased, with a small particle/copula
//! stopword set removed.

use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

/// Korean particles and copula fragments that carry no ranking signal.
const STOPWORDS: &[&str] = &[
    "이", "그", "저", "것", "수", "등", "및", "에", "의", "가", "을", "를", "은", "는", "이다",
    "있다", "하다", "되다", "있는", "하는", "되는",
];

/// Interrogatives and filler words removed when mining keywords out of a
/// question for relevance checks.
const QUESTION_STOPWORDS: &[&str] = &[
    "누가", "어떻게", "무엇", "어디", "언제", "왜", "있나요", "있어요", "알려주세요", "뭐야",
    "어떤", "것들",
];

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[가-힣a-zA-Z0-9]+").expect("valid token pattern"))
}

fn korean_word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[가-힣]{2,}").expect("valid word pattern"))
}

fn stopword_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOPWORDS.iter().copied().collect())
}

/// Splits text into scoring tokens: lowercase alphanumeric/Korean runs,
/// length >= 2, stopwords removed.
pub fn tokenize(text: &str) -> Vec<String> {
    token_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|token| token.chars().count() >= 2 && !stopword_set().contains(token.as_str()))
        .collect()
}

/// Extracts question keywords: Korean words of two or more syllables
/// minus interrogatives, in question order.
pub fn question_keywords(question: &str) -> Vec<String> {
    if question.is_empty() {
        return Vec::new();
    }
    korean_word_pattern()
        .find_iter(question)
        .map(|m| m.as_str().to_owned())
        .filter(|word| !QUESTION_STOPWORDS.contains(&word.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_keeps_korean_latin_digit_runs() {
        let tokens = tokenize("기초연금 신청 방법 top5!");
        assert_eq!(tokens, vec!["기초연금", "신청", "방법", "top5"]);
    }

    #[test]
    fn tokenize_drops_short_tokens_and_stopwords() {
        let tokens = tokenize("그 수 등 및 지원");
        assert_eq!(tokens, vec!["지원"]);
    }

    #[test]
    fn question_keywords_drop_interrogatives() {
        let keywords = question_keywords("기초연금 신청은 어떻게 하나요");
        assert!(keywords.contains(&"기초연금".to_owned()));
        assert!(!keywords.iter().any(|k| k == "어떻게"));
    }
}
