//! Intent gate: routes a question to welfare inquiry, casual
//! conversation, or irrelevant before any retrieval work is spent.

use common::response::Intent;
use regex::Regex;
use tracing::debug;

/// Fixed welfare-domain keyword list. Any substring hit routes the
/// question to the retrieval pipeline. Region names count as domain
/// keywords: "부산 경로우대" must not be rejected just because it is
/// phrased tersely.
const WELFARE_KEYWORDS: &[&str] = &[
    "복지", "노인", "어르신", "고령자", "연금", "의료비", "건강보험", "장기요양", "돌봄",
    "경로당", "틀니", "보청기", "목욕", "이미용", "식사배달", "효도수당", "장수축하",
    "참전유공자", "보훈", "기초생활수급", "의료급여", "국민기초생활보장", "차상위", "긴급복지",
    "지원", "수당", "서비스", "정책", "혜택", "신청", "요양", "간병", "재활", "건강", "의료",
    "병원", "약", "치료", "경로우대", "할인", "교통", "버스", "지하철", "복지관", "노인회관",
    "양로원", "요양원", "급여", "보조금", "서울", "부산", "대구", "인천", "광주", "대전",
    "울산", "세종", "경기", "강원", "충북", "충남", "전북", "전남", "경북", "경남", "제주",
];

const GREETING_PATTERNS: &[&str] = &[
    r"^안녕$|^안녕하세요$|^안녕하십니까$",
    r"^(?i)hi$|^(?i)hello$|^하이$",
    r"고마워|감사합니다|고맙습니다",
];

const IRRELEVANT_PATTERNS: &[&str] = &[
    // Profanity and abuse
    r"바보|멍청|똥|쓰레기|꺼져|닥쳐|시끄|죽어",
    r"(?i)fuck|shit|damn|stupid|idiot",
    // Clearly off-topic categories
    r"자동차|여행|코딩|프로그래밍|스포츠|축구|야구",
    r"주식|투자|부동산|쇼핑|패션|뷰티",
    r"수학|물리|화학|영어|일본어|중국어",
    r"아이스크림|피자|치킨|맥주|음료|카페",
    r"게임|영화|드라마|음악|연예인|아이돌",
    r"컴퓨터|핸드폰|스마트폰|태블릿|노트북",
    r"날씨|기온|비|눈|태풍",
    r"정치|선거|대통령|국회의원",
    // Keyboard-mash / probe input
    r"테스트|(?i)test|ㅋ|ㅎ|ㄱ|ㄴ|123|abc",
];

const MIN_QUESTION_CHARS: usize = 2;

enum RuleMatcher {
    KeywordAny(&'static [&'static str]),
    RegexAny(Vec<Regex>),
    TooShort(usize),
}

struct IntentRule {
    matcher: RuleMatcher,
    intent: Intent,
}

impl IntentRule {
    fn matches(&self, question: &str) -> bool {
        match &self.matcher {
            RuleMatcher::KeywordAny(keywords) => keywords.iter().any(|kw| question.contains(kw)),
            RuleMatcher::RegexAny(patterns) => {
                patterns.iter().any(|pattern| pattern.is_match(question))
            }
            RuleMatcher::TooShort(min_chars) => question.trim().chars().count() < *min_chars,
        }
    }
}

/// Ordered rule cascade, first match wins. Unmatched questions default
/// to irrelevant: out-of-domain input is rejected, not attempted.
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        let rules = vec![
            IntentRule {
                matcher: RuleMatcher::KeywordAny(WELFARE_KEYWORDS),
                intent: Intent::WelfareInquiry,
            },
            IntentRule {
                matcher: RuleMatcher::RegexAny(compile_all(GREETING_PATTERNS)),
                intent: Intent::CasualConversation,
            },
            IntentRule {
                matcher: RuleMatcher::RegexAny(compile_all(IRRELEVANT_PATTERNS)),
                intent: Intent::Irrelevant,
            },
            IntentRule {
                matcher: RuleMatcher::TooShort(MIN_QUESTION_CHARS),
                intent: Intent::Irrelevant,
            },
        ];

        Self { rules }
    }

    pub fn classify(&self, question: &str) -> Intent {
        for rule in &self.rules {
            if rule.matches(question) {
                debug!(intent = %rule.intent, "intent rule matched");
                return rule.intent;
            }
        }
        Intent::Irrelevant
    }
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid intent pattern"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welfare_question_is_routed_to_retrieval() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("기초연금 신청 방법이 궁금합니다"),
            Intent::WelfareInquiry
        );
    }

    #[test]
    fn greeting_is_casual() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("안녕하세요"),
            Intent::CasualConversation
        );
        assert_eq!(
            classifier.classify("감사합니다"),
            Intent::CasualConversation
        );
    }

    #[test]
    fn off_topic_is_irrelevant() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("오늘 날씨 어때요?"), Intent::Irrelevant);
        assert_eq!(classifier.classify("주식 투자 어때"), Intent::Irrelevant);
    }

    #[test]
    fn keyboard_mash_is_irrelevant() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("ㅋㅋㅋ"), Intent::Irrelevant);
        assert_eq!(classifier.classify("?"), Intent::Irrelevant);
    }

    #[test]
    fn unmatched_questions_default_to_irrelevant() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("우리 동네 도서관 개방 시간"),
            Intent::Irrelevant
        );
    }

    #[test]
    fn welfare_keywords_beat_irrelevant_patterns() {
        // "교통" is a welfare keyword even though "버스" questions could
        // look like small talk; rule order decides.
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("어르신 버스 요금 할인 되나요"),
            Intent::WelfareInquiry
        );
    }
}
