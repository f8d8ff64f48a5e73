//! Answer synthesis: a deterministic template strategy that is always
//! available, and an optional external-generation strategy that falls
//! back to the template on any failure.

use std::collections::BTreeSet;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use common::{
    document::{ScoredDocument, NATIONWIDE},
    error::AppError,
};
use rand::{seq::SliceRandom, Rng};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};
use tracing::{info, warn};

use crate::extraction::formatter::FormattedPolicy;

pub const SYSTEM_PROMPT: &str = "당신은 노인복지 정책 전문 상담사입니다.\n\
제공된 정책 자료만을 바탕으로 정확하고 친절하게 답변하세요.\n\
자료에 없는 내용은 절대 지어내지 마세요.\n\
복지 정책과 무관한 질문에는 답변하지 마세요.";

const CONTACT_FOOTER: &str = "\n💡 **추가 문의**\n\
• 더 자세한 내용은 관할 주민센터나 구청에 문의하세요.\n\
• 복지로 홈페이지(www.bokjiro.go.kr)에서도 확인할 수 있습니다.\n";

const CALL_CENTER_LINE: &str = "• 보건복지상담센터: 129\n";

/// External text generation seam. May fail or time out; callers must
/// always have the template path ready.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError>;
}

/// Chat-completion backed generation with a bounded timeout and a
/// small bounded retry.
pub struct OpenAiGeneration {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    max_retries: usize,
}

impl OpenAiGeneration {
    pub fn new(
        client: Client<OpenAIConfig>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
        max_retries: usize,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
            timeout,
            max_retries,
        }
    }

    async fn request_once(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessage::from(system_prompt.to_owned()).into(),
                ChatCompletionRequestUserMessage::from(user_prompt.to_owned()).into(),
            ])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "generation request timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_owned())
            .ok_or_else(|| AppError::Generation("generation returned no content".to_owned()))
    }
}

#[async_trait]
impl GenerationClient for OpenAiGeneration {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AppError> {
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .map(jitter)
            .take(self.max_retries);

        let answer = Retry::spawn(retry_strategy, || {
            self.request_once(system_prompt, user_prompt)
        })
        .await?;

        info!(answer_chars = answer.chars().count(), "generation complete");
        Ok(answer)
    }
}

/// Deterministic answer assembly from document content and extracted
/// policy blocks.
#[derive(Debug, Default)]
pub struct TemplateSynthesizer;

impl TemplateSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Groups ranked document content under fixed answer sections and
    /// emits up to two items per section with source attribution.
    pub fn synthesize_categorized(&self, question: &str, documents: &[ScoredDocument]) -> String {
        const CATEGORY_ORDER: &[(Category, &str)] = &[
            (Category::Definition, "\n📋 **정책 개요**\n"),
            (Category::Target, "\n👥 **지원 대상**\n"),
            (Category::Condition, "\n📌 **신청 조건**\n"),
            (Category::Benefit, "\n💰 **제공 혜택**\n"),
            (Category::Application, "\n📝 **신청 방법**\n"),
        ];

        let mut answer = format!("'{question}'에 대한 상세 정보를 안내해드리겠습니다.\n");

        for (category, header) in CATEGORY_ORDER {
            let items: Vec<&ScoredDocument> = documents
                .iter()
                .filter(|doc| categorize_content(&doc.document.content) == *category)
                .take(2)
                .collect();
            if items.is_empty() {
                continue;
            }
            answer.push_str(header);
            for (i, item) in items.iter().enumerate() {
                answer.push_str(&format!("{}. {}\n", i + 1, item.document.content));
                answer.push_str(&format!(
                    "   (출처: {}, {})\n\n",
                    item.document.metadata.filename, item.document.metadata.region
                ));
            }
        }

        answer.push_str(CONTACT_FOOTER);
        answer
    }

    /// Strict production path: at most two distinct policies, one
    /// nationwide block first if present, then one from the target
    /// region. Without a target match the remaining regions are
    /// sampled through the injected random source.
    pub fn synthesize_strict<R: Rng>(
        &self,
        question: &str,
        policies: &[FormattedPolicy],
        target_region: Option<&str>,
        rng: &mut R,
    ) -> String {
        let mut answer =
            format!("'{question}'에 대한 복지 정책 정보를 안내해드리겠습니다.\n");

        // First usable block per region, in rank order.
        let mut by_region: Vec<(&str, &str)> = Vec::new();
        for policy in policies {
            if !by_region
                .iter()
                .any(|(region, _)| *region == policy.region.as_str())
            {
                by_region.push((policy.region.as_str(), policy.formatted_text.as_str()));
            }
        }

        let mut shown_regions: Vec<&str> = Vec::new();

        if let Some(&(region, text)) = by_region.iter().find(|(region, _)| *region == NATIONWIDE) {
            answer.push_str(&format!("\n{text}\n"));
            shown_regions.push(region);
        }

        if shown_regions.len() < 2 {
            let target_block = target_region.and_then(|target| {
                by_region
                    .iter()
                    .find(|(region, _)| *region == target && !shown_regions.contains(region))
                    .copied()
            });
            match target_block {
                Some((region, text)) => {
                    answer.push_str(&format!("\n{text}\n"));
                    shown_regions.push(region);
                }
                None => {
                    // Regions sorted before sampling, so a fixed seed
                    // pins which one is picked.
                    let mut other_regions: Vec<&str> = by_region
                        .iter()
                        .map(|&(region, _)| region)
                        .filter(|region| !shown_regions.contains(region))
                        .collect();
                    other_regions.sort_unstable();
                    if let Some(&region) = other_regions.choose(rng) {
                        if let Some(&(_, text)) =
                            by_region.iter().find(|&&(r, _)| r == region)
                        {
                            answer.push_str(&format!("\n{text}\n"));
                            shown_regions.push(region);
                        }
                    }
                }
            }
        }

        if shown_regions.is_empty() {
            warn!("no policy blocks available for the strict template");
        }

        answer.push_str(CONTACT_FOOTER);
        answer.push_str(CALL_CENTER_LINE);
        answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Definition,
    Target,
    Condition,
    Benefit,
    Application,
}

/// First-match keyword routing of a content block into an answer
/// section. Everything without a recognized keyword reads as a policy
/// definition.
fn categorize_content(content: &str) -> Category {
    const TARGET: &[&str] = &["대상", "해당", "자격"];
    const CONDITION: &[&str] = &["조건", "기준", "요건"];
    const BENEFIT: &[&str] = &["혜택", "지원", "급여", "서비스"];
    const APPLICATION: &[&str] = &["신청", "접수", "등록", "제출"];

    if TARGET.iter().any(|kw| content.contains(kw)) {
        Category::Target
    } else if CONDITION.iter().any(|kw| content.contains(kw)) {
        Category::Condition
    } else if BENEFIT.iter().any(|kw| content.contains(kw)) {
        Category::Benefit
    } else if APPLICATION.iter().any(|kw| content.contains(kw)) {
        Category::Application
    } else {
        Category::Definition
    }
}

/// Prompt for the external-generation path. Grounding-only, exactly
/// two policies, mandatory region labels, no mention of regions absent
/// from the material.
pub fn build_generation_prompt(
    question: &str,
    context: &str,
    target_region: Option<&str>,
    seen_regions: &BTreeSet<String>,
) -> String {
    let region_info = match target_region {
        Some(region) => format!(
            "\n**중요**: 사용자의 거주 지역은 '{region}'입니다. 이 지역의 정책을 설명해주세요."
        ),
        None if !seen_regions.is_empty() => {
            let regions: Vec<&str> = seen_regions.iter().map(String::as_str).collect();
            format!(
                "\n**참고**: 현재 자료에는 다음 지역의 정보가 있습니다: {}",
                regions.join(", ")
            )
        }
        None => String::new(),
    };

    format!(
        "아래 복지 정책 자료를 바탕으로 질문에 답변해주세요.\n\n\
【정책 자료】\n{context}\n\n\
【질문】\n{question}\n\n\
【답변 작성 지침】{region_info}\n\
1. **제공된 자료에만 기반**하여 답변하세요. 자료에 없는 내용은 절대 만들어내지 마세요.\n\n\
2. **정확히 2개의 정책만 설명하세요** (필수! 절대 3개 이상 쓰지 마세요):\n\
   - 우선순위 1: 전국 정책 1개 (자료에 '전국'이 있으면 반드시 먼저)\n\
   - 우선순위 2: 시도 지역 정책 1개 (사용자 지역 우선, 없으면 자료 중 하나)\n\
   - 총 2개 초과하면 안 됩니다!\n\n\
3. **정책 설명 시 반드시 지역을 명시하세요**:\n\
   - 각 정책 앞에 반드시 지역 정보를 포함하세요\n\
   - 예시: \"**부산 지역 - 노인일자리사업**\" 또는 \"**전국 - 기초연금**\"\n\
   - 지역 정보가 없는 정책 설명은 절대 작성하지 마세요\n\n\
4. 정책명, 지원 대상, 지원 내용, 신청 방법을 명확히 구분하여 설명하세요.\n\n\
5. 구체적인 금액, 조건, 기준이 있다면 정확히 명시하세요.\n\n\
6. **중요**: 사용자가 명시적으로 요청한 정보에 대해서만 답변하세요. \
사용자가 묻지 않은 지역이나 정책에 대해 \"없다\"고 언급하지 마세요.\n\n\
7. 제공된 자료에 있는 정책만 설명하고, 자료에 없는 지역/정책은 아예 언급하지 마세요.\n\n\
8. 친절하고 이해하기 쉬운 말투로 작성하세요.\n\n\
답변:"
    )
}
