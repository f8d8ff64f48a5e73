//! Declarative filter and scoring rules for policy field extraction.
//!
//! Government PDF chunks are noisy: statute citations, ministry phone
//! numbers, form boilerplate. The filters here throw those lines away
//! and the per-category rule tables score what remains.

use regex::Regex;

/// One scoring table per extracted category.
pub struct CategoryRules {
    membership_keywords: &'static [&'static str],
    membership_pattern: Option<Regex>,
    positive_keywords: &'static [(&'static str, f32)],
    positive_patterns: Vec<(Regex, f32)>,
    negative_patterns: Vec<(Regex, f32)>,
    short_line_chars: usize,
    short_line_penalty: f32,
    pub max_chars: usize,
}

impl CategoryRules {
    /// Whether the line belongs to this category at all.
    pub fn is_member(&self, line: &str) -> bool {
        if self
            .membership_keywords
            .iter()
            .any(|keyword| line.contains(keyword))
        {
            return true;
        }
        self.membership_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(line))
    }

    /// Weighted score for a member line. Negative scores mean the line
    /// is boilerplate and must be discarded.
    pub fn score(&self, line: &str) -> f32 {
        let mut score = 0.0;
        for (keyword, weight) in self.positive_keywords {
            if line.contains(keyword) {
                score += weight;
            }
        }
        for (pattern, weight) in &self.positive_patterns {
            if pattern.is_match(line) {
                score += weight;
            }
        }
        for (pattern, weight) in &self.negative_patterns {
            if pattern.is_match(line) {
                score += weight;
            }
        }
        if line.chars().count() < self.short_line_chars {
            score += self.short_line_penalty;
        }
        score
    }
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid extraction pattern")
}

fn compile(pairs: &[(&str, f32)]) -> Vec<(Regex, f32)> {
    pairs
        .iter()
        .map(|(pattern, weight)| (regex(pattern), *weight))
        .collect()
}

pub fn target_rules() -> CategoryRules {
    CategoryRules {
        membership_keywords: &[
            "대상",
            "신청자격",
            "수급권자",
            "받을 수 있",
            "이용할 수 있",
            "신청할 수 있",
            "해당하는 사람",
            "해당자",
        ],
        membership_pattern: None,
        positive_keywords: &[
            ("지원대상", 3.5),
            ("신청자격", 3.5),
            ("수급권자", 3.0),
            ("세 이상", 2.5),
            ("세이상", 2.5),
            ("이하인 자", 2.0),
            ("해당하는 자", 2.5),
            ("노인", 1.0),
            ("어르신", 1.0),
            ("고령자", 1.5),
            ("소득인정액", 2.5),
            ("기준중위소득", 3.0),
            ("가구", 1.5),
            ("만", 1.0),
            ("차상위", 2.0),
        ],
        positive_patterns: compile(&[(r"만\s*\d+세", 3.5)]),
        negative_patterns: compile(&[
            (r"신청권자\s*:", -15.0),
            (r"신청권자\s*는", -15.0),
            (r"법률.*?제\d+호", -15.0),
            (r"「[^」]+」", -12.0),
            (r#"이하\s*["'][^"']+["']"#, -12.0),
            (r"\d{3}[-\s]\d{3,4}[-\s]\d{4}", -15.0),
            (r"보건복지부", -10.0),
            (r"^[※○●■]\s*", -5.0),
        ]),
        short_line_chars: 30,
        short_line_penalty: -3.0,
        max_chars: 200,
    }
}

pub fn benefit_rules() -> CategoryRules {
    CategoryRules {
        membership_keywords: &[
            "지원내용", "혜택", "급여", "무료", "할인", "감면", "지급", "제공",
        ],
        membership_pattern: Some(regex(r"\d+[만원천백십억조]")),
        positive_keywords: &[
            ("지원내용", 3.5),
            ("지원금액", 3.5),
            ("급여내용", 3.5),
            ("지원금", 3.0),
            ("급여액", 3.0),
            ("월", 1.5),
            ("원", 1.5),
            ("만원", 3.0),
            ("무료", 3.0),
            ("할인", 3.0),
            ("감면", 3.0),
            ("제공", 1.0),
            ("지원", 1.0),
            ("지급", 2.5),
            ("서비스", 1.5),
            ("프로그램", 1.5),
            ("보조기기", 2.0),
        ],
        positive_patterns: compile(&[
            (r"\d+[,\d]*\s*[만원천백십억조]", 3.5),
            (r"\d+\s*%", 2.0),
        ]),
        negative_patterns: compile(&[
            (r"법률.*?제\d+호", -15.0),
            (r"「[^」]+」", -12.0),
            (r#"이하\s*["'][^"']+["']"#, -12.0),
            (r"\d{3}[-\s]\d{3,4}[-\s]\d{4}", -15.0),
            (r"보건복지부", -10.0),
            (r"고궁.*?능원.*?박물관", -10.0),
            (r"체의\s*수송시설", -10.0),
            (r"^[※○●■]\s*", -5.0),
            (r"사업.*?총괄", -15.0),
            (r"정서적\s*지원\s*등\s*필요한\s*서비스", -10.0),
        ]),
        short_line_chars: 25,
        short_line_penalty: -3.0,
        max_chars: 200,
    }
}

pub fn application_rules() -> CategoryRules {
    CategoryRules {
        membership_keywords: &[
            "신청방법",
            "신청절차",
            "주민센터",
            "구청",
            "시청",
            "읍면동",
            "동사무소",
            "문의",
            "담당",
            "접수",
        ],
        membership_pattern: Some(regex(r"\d{2,4}[- ]\d{3,4}[- ]\d{4}")),
        positive_keywords: &[
            ("신청방법", 3.5),
            ("신청절차", 3.5),
            ("신청서", 3.0),
            ("주민센터", 3.0),
            ("구청", 3.0),
            ("시청", 3.0),
            ("군청", 3.0),
            ("읍면동", 3.0),
            ("동사무소", 3.0),
            ("행정복지센터", 3.0),
            ("온라인", 2.5),
            ("방문", 2.5),
            ("우편", 2.5),
            ("제출", 2.0),
            ("접수", 2.5),
            ("신청", 1.0),
        ],
        positive_patterns: Vec::new(),
        negative_patterns: compile(&[
            (r"법률.*?제\d+호", -15.0),
            (r"「[^」]+」", -12.0),
            (r"보건복지부.*?\(.*?총괄", -20.0),
            (r"^[※○●■]\s*보건복지부", -20.0),
            (r"사례관리사업.*?유관기관", -10.0),
            (r"읍면동행정복지센터\s*및\s*유관기관", -10.0),
        ]),
        short_line_chars: 25,
        short_line_penalty: -3.0,
        max_chars: 200,
    }
}

pub fn description_rules() -> CategoryRules {
    CategoryRules {
        // Membership for descriptions is decided by the extractor
        // (welfare keyword plus explanatory keyword, or a question
        // keyword hit), so the table carries scoring only.
        membership_keywords: &[],
        membership_pattern: None,
        positive_keywords: &[
            ("사업", 1.5),
            ("정책", 2.5),
            ("제도", 2.5),
            ("목적", 3.5),
            ("위하여", 2.5),
            ("위해", 2.5),
            ("지원하는", 2.5),
            ("제공하는", 2.5),
            ("서비스", 1.5),
            ("복지", 1.5),
            ("프로그램", 1.5),
            ("노인", 1.0),
            ("어르신", 1.0),
            ("고령자", 1.0),
            ("대상으로", 2.0),
            ("통하여", 2.0),
        ],
        positive_patterns: compile(&[
            (r"[이란은는]\s+.*?[하위].*?[는다제]", 2.5),
            (r"목적.*?[하위].*?[다며]", 3.5),
            (r"통해.*?지원", 2.5),
            (r"대상으로.*?지원", 3.0),
        ]),
        negative_patterns: compile(&[
            (r"^「[^」]+」.*?제\d+조", -20.0),
            (r"^「[^」]+법[^」]*」", -15.0),
            (r#"이하\s*["'][^"']+["'].*?제\d+조"#, -20.0),
            (r"\d{3}[-\s]\d{3,4}[-\s]\d{4}", -15.0),
            (r"^[※○●■]\s*보건복지부", -20.0),
            (r"사업\s*총괄.*?지원", -15.0),
            (r"^[가-힣\s]*사업.*?지원$", -10.0),
            (r"인권교육.*?취업제한", -15.0),
            (r"치매예방.*?물리치료", -10.0),
        ]),
        short_line_chars: 0,
        short_line_penalty: 0.0,
        max_chars: 250,
    }
}

/// Length bonus specific to descriptions: longer explanatory sentences
/// read better in the answer than clipped fragments.
pub fn description_length_bonus(line: &str) -> f32 {
    let chars = line.chars().count();
    if chars >= 50 {
        2.5
    } else if chars >= 40 {
        1.5
    } else if chars < 30 {
        -2.0
    } else {
        0.0
    }
}

pub struct LineFilters {
    junk: Vec<Regex>,
    law_patterns: Vec<Regex>,
    contact_pattern: Regex,
    contact_prefix: Regex,
}

impl Default for LineFilters {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFilters {
    pub fn new() -> Self {
        Self {
            junk: vec![
                regex(r"^제\d+조"),
                regex(r"법률\s*제\d+호"),
                regex(r"페이지|법제처|국가법령정보센터"),
                regex(r"발간등록번호"),
                regex(r"Ministry|www\.|http"),
                regex(r"^\d{4}년\s*\d{1,2}월\s*\d{1,2}일$"),
                regex(r"^-{3,}$"),
                regex(r"^[○●■□◇◆▶▷]\s*$"),
            ],
            law_patterns: vec![
                regex(r#"이하\s*["']"#),
                regex(r"제\d+조|제\d+항|제\d+호"),
                regex(r"^[①②③④⑤⑥⑦⑧⑨⑩]"),
                regex(r"^\d+\.\s"),
                regex(r"이\s*법은|이\s*영은|이\s*규칙은"),
                regex(r"다만,|단서|부칙|시행령|시행규칙"),
                regex(r"변경을\s*초래하는|결혼·이혼|배우자의\s*사망"),
                regex(r"^[*※＊]\s"),
                regex(r"예상연금액|실지급액|다를\s*수\s*있습니다"),
                regex(r"^(변경|중지|정지|유의사항|참고|안내)[:：]\s*"),
            ],
            contact_pattern: regex(r"보건복지부.*?\d{2,4}[-\s]\d{3,4}[-\s]\d{4}"),
            contact_prefix: regex(r"^[※○●■]\s*보건복지부"),
        }
    }

    /// Metadata lines with no policy content: statute headers, page
    /// footers, bare separators.
    pub fn is_junk(&self, line: &str) -> bool {
        self.junk.iter().any(|pattern| pattern.is_match(line))
    }

    /// Lines that are statute text rather than program descriptions.
    pub fn is_pure_law_reference(&self, line: &str) -> bool {
        if line.contains('「') && line.contains('」') {
            return true;
        }
        if line.contains("공포") && line.contains("시행") {
            return true;
        }
        if line.contains("귀하의") && (line.contains("보호자") || line.contains("지원기관")) {
            return true;
        }
        const FORM_TERMS: &[&str] = &[
            "질병관리청장",
            "특별자치시장",
            "특별자치도지사",
            "보상청구서",
            "첨부하여",
        ];
        if FORM_TERMS.iter().any(|term| line.contains(term)) {
            return true;
        }
        self.law_patterns.iter().any(|pattern| pattern.is_match(line))
    }

    /// Ministry contact lines that would otherwise score as
    /// application info.
    pub fn is_government_contact(&self, line: &str) -> bool {
        if self.contact_pattern.is_match(line) {
            const DESK_TERMS: &[&str] = &["총괄", "담당", "정책과", "인권교육", "취업제한"];
            if DESK_TERMS.iter().any(|term| line.contains(term)) {
                return true;
            }
        }
        self.contact_prefix.is_match(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statute_lines_are_law_references() {
        let filters = LineFilters::new();
        assert!(filters.is_pure_law_reference("「노인복지법」 제27조에 따라"));
        assert!(filters.is_pure_law_reference("① 국가는 노인의 보건을"));
        assert!(filters.is_pure_law_reference("이 법은 노인의 복지 증진을 목적으로 한다"));
        assert!(!filters.is_pure_law_reference("만 65세 이상 어르신에게 매월 지원금을 지급합니다"));
    }

    #[test]
    fn page_footers_are_junk() {
        let filters = LineFilters::new();
        assert!(filters.is_junk("법제처 국가법령정보센터"));
        assert!(filters.is_junk("2024년 1월 1일"));
        assert!(!filters.is_junk("기초연금 지원대상 안내"));
    }

    #[test]
    fn ministry_desk_lines_are_contacts() {
        let filters = LineFilters::new();
        assert!(filters.is_government_contact("보건복지부 노인정책과 (총괄) 044-202-3430"));
        assert!(filters.is_government_contact("※ 보건복지부 문의처 안내"));
        assert!(!filters.is_government_contact("주민센터에 방문하여 신청하세요"));
    }

    #[test]
    fn contact_lines_score_below_zero_for_application() {
        let rules = application_rules();
        let line = "※ 보건복지부 노인정책과로 문의";
        assert!(rules.score(line) < 0.0);
    }

    #[test]
    fn concrete_amounts_boost_benefit_score() {
        let rules = benefit_rules();
        let with_amount = "매월 최대 334,810원의 기초연금을 지급하며 교통비 할인 서비스 제공";
        let without = "관련 내용은 추후 안내";
        assert!(rules.is_member(with_amount));
        assert!(rules.score(with_amount) > rules.score(without));
    }
}
