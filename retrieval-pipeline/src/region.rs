//! Region resolution and region-first ordering of retrieved documents.
//!
//! Document metadata carries short region codes ("경북"), so user
//! profiles and question text are normalized to the same codes before
//! any comparison.

use common::document::{ScoredDocument, NATIONWIDE};
use tracing::{debug, info, warn};

/// Long administrative names mapped to the short codes used in
/// document metadata.
const REGION_MAPPING: &[(&str, &str)] = &[
    ("서울특별시", "서울"),
    ("부산광역시", "부산"),
    ("대구광역시", "대구"),
    ("인천광역시", "인천"),
    ("광주광역시", "광주"),
    ("대전광역시", "대전"),
    ("울산광역시", "울산"),
    ("세종특별자치시", "세종"),
    ("경기도", "경기"),
    ("강원특별자치도", "강원"),
    ("충청북도", "충북"),
    ("충청남도", "충남"),
    ("전북특별자치도", "전북"),
    ("전라남도", "전남"),
    ("경상북도", "경북"),
    ("경상남도", "경남"),
    ("제주특별자치도", "제주"),
];

/// Per-region keyword lists scanned for inside question text, in a
/// fixed order so resolution is deterministic when several appear.
/// Long administrative forms count too: "경상북도 노인 혜택" resolves
/// to 경북 even though the short code never appears.
const REGION_KEYWORDS: &[(&str, &[&str])] = &[
    ("서울", &["서울", "서울특별시"]),
    ("부산", &["부산", "부산광역시"]),
    ("대구", &["대구", "대구광역시"]),
    ("인천", &["인천", "인천광역시"]),
    ("광주", &["광주", "광주광역시"]),
    ("대전", &["대전", "대전광역시"]),
    ("울산", &["울산", "울산광역시"]),
    ("세종", &["세종", "세종특별자치시"]),
    ("경기", &["경기", "경기도"]),
    ("강원", &["강원", "강원도", "강원특별자치도"]),
    ("충북", &["충북", "충청북도"]),
    ("충남", &["충남", "충청남도"]),
    ("전북", &["전북", "전라북도", "전북특별자치도"]),
    ("전남", &["전남", "전라남도"]),
    ("경북", &["경북", "경상북도"]),
    ("경남", &["경남", "경상남도"]),
    ("제주", &["제주", "제주도", "제주특별자치도"]),
];

#[derive(Debug, Default)]
pub struct RegionResolver;

impl RegionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes a region string to its short code. Long names map
    /// through [`REGION_MAPPING`], known short codes pass through, and
    /// anything else is `None` so garbage profile values never become
    /// a filter.
    pub fn normalize(&self, region: &str) -> Option<String> {
        let trimmed = region.trim();
        REGION_MAPPING
            .iter()
            .find(|(long, short)| trimmed == *long || trimmed == *short)
            .map(|(_, short)| (*short).to_string())
    }

    /// Picks the target region for a request. A recognized profile
    /// region always wins over a region mentioned in the question; a
    /// conflict is logged, not an error. An unrecognized profile value
    /// is ignored. With no usable profile, the first region keyword
    /// found in the question decides. Returns `None` when neither
    /// source names a region.
    pub fn resolve(&self, profile_region: Option<&str>, question: &str) -> Option<String> {
        let question_region = REGION_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|keyword| question.contains(keyword)))
            .map(|(short, _)| (*short).to_string());

        if let Some(profile) = profile_region.filter(|p| !p.trim().is_empty()) {
            match self.normalize(profile) {
                Some(resolved) => {
                    if let Some(from_question) = &question_region {
                        if from_question != &resolved {
                            info!(
                                profile = %resolved,
                                question = %from_question,
                                "region conflict, profile region wins"
                            );
                        }
                    }
                    return Some(resolved);
                }
                None => {
                    warn!(profile = %profile.trim(), "unrecognized profile region, ignoring");
                }
            }
        }

        if let Some(region) = &question_region {
            debug!(region = %region, "region taken from question text");
        }
        question_region
    }
}

/// Orders documents nationwide first, then the target region, then
/// everything else, assigning the domain boost each tier carries into
/// answer synthesis. The sort is stable so rerank order survives
/// within each tier.
pub fn sort_by_region(mut documents: Vec<ScoredDocument>, target: Option<&str>) -> Vec<ScoredDocument> {
    for document in &mut documents {
        document.domain_boost = region_boost(&document.document.metadata.region, target);
    }
    documents.sort_by(|a, b| {
        b.domain_boost
            .partial_cmp(&a.domain_boost)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    documents
}

fn region_boost(region: &str, target: Option<&str>) -> f32 {
    if region == NATIONWIDE {
        2.0
    } else if target.is_some_and(|target| region == target) {
        1.0
    } else {
        0.0
    }
}
