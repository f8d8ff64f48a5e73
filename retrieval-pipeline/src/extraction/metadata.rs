//! Known national welfare programs, keyed by filename and content
//! keywords. Extraction falls back to these canonical names and
//! bokjiro.go.kr links when a chunk matches a well-known program.

pub struct PolicyMetadata {
    pub key: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    pub category: &'static str,
    pub keywords: &'static [&'static str],
}

pub const DEFAULT_POLICY_URL: &str =
    "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52005M.do";

const POLICY_METADATA: &[PolicyMetadata] = &[
    PolicyMetadata {
        key: "의료급여",
        name: "의료급여",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000149",
        category: "건강",
        keywords: &["의료급여", "의료지원", "의료비"],
    },
    PolicyMetadata {
        key: "기초연금",
        name: "기초연금",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000156",
        category: "노령",
        keywords: &["기초연금", "노령연금"],
    },
    PolicyMetadata {
        key: "장기요양",
        name: "노인장기요양보험",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000292",
        category: "돌봄",
        keywords: &["장기요양", "요양보험", "장기요양보험"],
    },
    PolicyMetadata {
        key: "경로우대",
        name: "경로우대 제도",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00001876",
        category: "문화",
        keywords: &["경로우대", "교통", "할인", "무료"],
    },
    PolicyMetadata {
        key: "노인일자리",
        name: "노인일자리 및 사회활동 지원사업",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000191",
        category: "고용",
        keywords: &["노인일자리", "사회활동", "일자리"],
    },
    PolicyMetadata {
        key: "노인복지관",
        name: "노인복지관 운영",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000185",
        category: "여가",
        keywords: &["노인복지관", "복지관", "여가"],
    },
    PolicyMetadata {
        key: "경로당",
        name: "경로당 운영",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000186",
        category: "여가",
        keywords: &["경로당"],
    },
    PolicyMetadata {
        key: "노인돌봄",
        name: "노인맞춤돌봄서비스",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000165",
        category: "돌봄",
        keywords: &["노인돌봄", "돌봄서비스", "맞춤돌봄"],
    },
    PolicyMetadata {
        key: "재난적의료비",
        name: "재난적의료비 지원",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00004044",
        category: "건강",
        keywords: &["재난적의료비", "의료비지원"],
    },
    PolicyMetadata {
        key: "노인건강",
        name: "노인 건강검진",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000160",
        category: "건강",
        keywords: &["건강검진", "건강진단"],
    },
    PolicyMetadata {
        key: "보훈",
        name: "국가유공자 등 예우 및 지원",
        url: "https://www.bokjiro.go.kr/ssis-tbu/twataa/wlfareInfo/moveTWAT52011M.do?wlfareInfoId=WLF00000137",
        category: "보상",
        keywords: &["보훈", "국가유공자", "보훈수당"],
    },
];

/// Looks up a known program for a chunk. Filename matches take
/// priority over content keyword matches; table order breaks ties.
pub fn find_policy_metadata(text: &str, filename: &str) -> Option<&'static PolicyMetadata> {
    let filename_lower = filename.to_lowercase();
    if let Some(meta) = POLICY_METADATA
        .iter()
        .find(|meta| filename_lower.contains(meta.key))
    {
        return Some(meta);
    }

    let text_lower = text.to_lowercase();
    POLICY_METADATA.iter().find(|meta| {
        meta.keywords
            .iter()
            .any(|keyword| text_lower.contains(keyword))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_match_wins_over_content() {
        let meta = find_policy_metadata("장기요양 등급 판정 절차", "기초연금_안내.pdf");
        assert_eq!(meta.map(|m| m.name), Some("기초연금"));
    }

    #[test]
    fn content_keyword_match_as_fallback() {
        let meta = find_policy_metadata("노령연금 수급 자격 안내", "문서.pdf");
        assert_eq!(meta.map(|m| m.name), Some("기초연금"));
    }

    #[test]
    fn unknown_content_yields_none() {
        assert!(find_policy_metadata("청년 월세 지원", "기타.pdf").is_none());
    }
}
