//! Request-level facade: intent gate, region resolution, retrieval,
//! synthesis, and the caller-facing response contract.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use common::{
    error::AppError,
    response::{extract_sources, ChatResponse, Confidence, Intent},
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

use crate::{
    extraction::formatter::{FormattedPolicy, PolicyFormatter},
    intent::IntentClassifier,
    pipeline::{run_pipeline, PipelineTuning, METHOD_NO_DOCUMENTS},
    region::{sort_by_region, RegionResolver},
    retriever::DocumentRetriever,
    synthesis::{build_generation_prompt, GenerationClient, TemplateSynthesizer, SYSTEM_PROMPT},
};

const METHOD_GENERATED: &str = "openai_llm";
const METHOD_TEMPLATE_FALLBACK: &str = "enhanced_policy_extraction_fallback";

const EMPTY_QUESTION_ANSWER: &str = "질문을 입력해주세요.";

const GREETING_ANSWER: &str =
    "안녕하세요! 노인복지 정책에 대해 궁금한 것이 있으시면 언제든 물어보세요.";
const THANKS_ANSWER: &str =
    "천만에요! 더 궁금한 복지 정책이 있으시면 언제든 말씀해주세요.";
const CASUAL_GENERAL_ANSWER: &str = "안녕하세요! 저는 노인복지 정책 상담을 도와드리는 AI입니다. \
복지 관련 질문을 해주시면 도움을 드릴게요!";

const IRRELEVANT_ANSWER: &str = "죄송하지만, 저는 노인복지 정책 전문 상담 AI입니다.

다음과 같은 노인복지 관련 질문에 답변드릴 수 있습니다:
• 기초연금 및 노인수당
• 의료비 지원 (건강보험료, 장기요양보험료)
• 노인돌봄서비스 (식사배달, 목욕서비스 등)
• 보건의료 지원 (틀니, 보청기, 건강검진 등)
• 참전유공자 예우
• 지역별 노인복지 정책

복지 정책에 대해 궁금한 점이 있으시면 언제든 말씀해주세요!";

/// Maximum ranked documents fed to the formatting/context step.
const MAX_CONTEXT_DOCUMENTS: usize = 10;
/// Maximum formatted policy blocks embedded in the generation prompt.
const MAX_CONTEXT_PARTS: usize = 8;

fn no_documents_found_answer(question: &str) -> String {
    format!(
        "질문하신 '{question}'에 대한 정확한 정보를 현재 보유한 복지 정책 자료에서 찾지 못했습니다.

다음과 같은 방법으로 도움을 받으실 수 있습니다:
• 가까운 주민센터 또는 구청 방문
• 복지로 홈페이지(www.bokjiro.go.kr) 확인
• 보건복지상담센터(129) 전화상담

더 구체적인 복지 정책에 대해 질문해주시면 도움을 드리겠습니다."
    )
}

/// One instance per process; all collaborators are injected so tests
/// can pin every source of nondeterminism.
pub struct WelfareRagService {
    retriever: Arc<dyn DocumentRetriever>,
    embedder: Arc<EmbeddingProvider>,
    generation: Option<Arc<dyn GenerationClient>>,
    classifier: IntentClassifier,
    resolver: RegionResolver,
    formatter: PolicyFormatter,
    synthesizer: TemplateSynthesizer,
    tuning: PipelineTuning,
    rng: Mutex<StdRng>,
}

impl WelfareRagService {
    pub fn new(
        retriever: Arc<dyn DocumentRetriever>,
        embedder: Arc<EmbeddingProvider>,
        generation: Option<Arc<dyn GenerationClient>>,
        config: &AppConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            retriever,
            embedder,
            generation,
            classifier: IntentClassifier::new(),
            resolver: RegionResolver::new(),
            formatter: PolicyFormatter::new(),
            synthesizer: TemplateSynthesizer::new(),
            tuning: PipelineTuning::with_top_k(config.top_k),
            rng: Mutex::new(rng),
        }
    }

    /// Answers one question. Every failure downstream of the intent
    /// gate degrades to a graceful canned message; this method only
    /// errors on internal invariant violations.
    pub async fn answer(
        &self,
        question: &str,
        user_region: Option<&str>,
    ) -> Result<ChatResponse, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(ChatResponse::new(
                EMPTY_QUESTION_ANSWER,
                Intent::Irrelevant,
                Confidence::High,
            ));
        }

        let intent = self.classifier.classify(question);
        info!(%intent, "question classified");

        match intent {
            Intent::CasualConversation => {
                return Ok(ChatResponse::new(
                    casual_answer(question),
                    intent,
                    Confidence::High,
                ));
            }
            Intent::Irrelevant => {
                return Ok(ChatResponse::new(IRRELEVANT_ANSWER, intent, Confidence::High));
            }
            Intent::WelfareInquiry => {}
        }

        let target_region = self.resolver.resolve(user_region, question);

        let outcome = run_pipeline(
            self.retriever.as_ref(),
            self.embedder.as_ref(),
            question,
            self.tuning,
        )
        .await?;

        if !outcome.found_documents() {
            let mut response = ChatResponse::new(
                no_documents_found_answer(question),
                Intent::WelfareInquiry,
                Confidence::Low,
            )
            .with_method(METHOD_NO_DOCUMENTS);
            response.context_used = Some(0);
            return Ok(response);
        }

        let documents = sort_by_region(outcome.documents, target_region.as_deref());

        // Formatted policy blocks drive both strategies: the strict
        // template directly, the generation path as grounding context.
        let formatted: Vec<FormattedPolicy> = documents
            .iter()
            .take(MAX_CONTEXT_DOCUMENTS)
            .filter_map(|doc| self.formatter.format_document(&doc.document, question))
            .collect();

        if formatted.is_empty() {
            let mut response = ChatResponse::new(
                no_documents_found_answer(question),
                Intent::WelfareInquiry,
                Confidence::Low,
            )
            .with_method(METHOD_NO_DOCUMENTS);
            response.context_used = Some(documents.len());
            return Ok(response);
        }

        let template_answer = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| AppError::InternalError("rng lock poisoned".to_owned()))?;
            self.synthesizer.synthesize_strict(
                question,
                &formatted,
                target_region.as_deref(),
                &mut *rng,
            )
        };

        let mut response = match self
            .try_generation(question, &formatted, target_region.as_deref())
            .await
        {
            Some(generated) => {
                let mut response =
                    ChatResponse::new(generated.clone(), Intent::WelfareInquiry, Confidence::High)
                        .with_method(METHOD_GENERATED);
                response.answer_pre_generation = Some(template_answer);
                response.answer_post_generation = Some(generated);
                response
            }
            None => {
                // Template output stands in for both variants so the
                // comparison flow sees identical strings.
                let mut response = ChatResponse::new(
                    template_answer.clone(),
                    Intent::WelfareInquiry,
                    Confidence::Medium,
                )
                .with_method(METHOD_TEMPLATE_FALLBACK);
                response.answer_pre_generation = Some(template_answer.clone());
                response.answer_post_generation = Some(template_answer);
                response
            }
        };

        response.sources = extract_sources(&documents);
        response.context_used = Some(documents.len());
        Ok(response)
    }

    /// Runs the external-generation strategy. `None` means the caller
    /// must use the template answer: the service is unconfigured, or
    /// it failed and the failure was absorbed here.
    async fn try_generation(
        &self,
        question: &str,
        formatted: &[FormattedPolicy],
        target_region: Option<&str>,
    ) -> Option<String> {
        let generation = self.generation.as_ref()?;

        let mut context_parts = Vec::new();
        let mut seen_regions = BTreeSet::new();
        for policy in formatted.iter().take(MAX_CONTEXT_PARTS) {
            context_parts.push(format!(
                "[{} - {}]\n{}",
                policy.region, policy.filename, policy.formatted_text
            ));
            seen_regions.insert(policy.region.clone());
        }
        let context = context_parts.join("\n\n---\n\n");

        let prompt = build_generation_prompt(question, &context, target_region, &seen_regions);

        match generation.generate(SYSTEM_PROMPT, &prompt).await {
            Ok(answer) => {
                let mut final_answer = answer;
                final_answer.push_str("\n\n💡 **추가 문의**\n");
                final_answer.push_str("• 더 자세한 내용은 관할 주민센터나 구청에 문의하세요.\n");
                final_answer
                    .push_str("• 복지로 홈페이지(www.bokjiro.go.kr)에서도 확인할 수 있습니다.\n");
                final_answer.push_str("• 보건복지상담센터: 129");
                Some(final_answer)
            }
            Err(error) => {
                warn!(%error, "generation failed, falling back to template answer");
                None
            }
        }
    }
}

fn casual_answer(question: &str) -> &'static str {
    const GREETING_TERMS: &[&str] = &["안녕", "하이", "hi", "hello"];
    const THANKS_TERMS: &[&str] = &["고마워", "감사", "잘했어"];

    if GREETING_TERMS.iter().any(|term| question.contains(term)) {
        GREETING_ANSWER
    } else if THANKS_TERMS.iter().any(|term| question.contains(term)) {
        THANKS_ANSWER
    } else {
        CASUAL_GENERAL_ANSWER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::InMemoryRetriever;
    use common::document::{Document, DocumentMetadata};

    const PENSION_CHUNK: &str = "\
어르신의 안정적인 노후 생활을 지원하기 위하여 매월 기초연금을 지급하는 제도입니다
지원대상: 만 65세 이상이며 소득인정액이 선정기준액 이하인 어르신 가구
지원내용: 매월 최대 334,810원의 기초연금을 지급하며 부부가구는 감액 적용
신청방법: 주소지 관할 주민센터 방문 신청 또는 복지로 온라인 접수 가능";

    const REGIONAL_CHUNK: &str = "\
지원대상: 경북에 주민등록을 둔 만 65세 이상 기초연금 수급 어르신
지원내용: 기초연금 수급 어르신에게 교통비를 분기별 지급하는 정책 지원
신청방법: 읍면동 행정복지센터 방문 접수";

    fn test_config() -> AppConfig {
        AppConfig {
            rng_seed: Some(7),
            ..AppConfig::default()
        }
    }

    async fn service_with(documents: Vec<(&str, &str, &str)>) -> WelfareRagService {
        let embedder = Arc::new(EmbeddingProvider::new_hashed(256));
        let mut entries = Vec::new();
        for (content, filename, region) in documents {
            let doc = Document::new(content, DocumentMetadata::new(filename, region));
            let embedding = embedder.embed(&doc.content).await.expect("hashed embed");
            entries.push((doc, embedding));
        }
        WelfareRagService::new(
            Arc::new(InMemoryRetriever::new(entries)),
            embedder,
            None,
            &test_config(),
        )
    }

    #[tokio::test]
    async fn empty_question_gets_the_prompt_message() {
        let service = service_with(Vec::new()).await;
        let response = service.answer("   ", None).await.expect("response");
        assert_eq!(response.answer, EMPTY_QUESTION_ANSWER);
        assert_eq!(response.confidence, Confidence::High);
    }

    #[tokio::test]
    async fn greeting_takes_the_casual_path() {
        let service = service_with(Vec::new()).await;
        let response = service.answer("안녕하세요", None).await.expect("response");
        assert_eq!(response.intent, Intent::CasualConversation);
        assert_eq!(response.answer, GREETING_ANSWER);
        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn off_topic_question_is_rejected_with_guidance() {
        let service = service_with(Vec::new()).await;
        let response = service
            .answer("오늘 날씨 어때요?", None)
            .await
            .expect("response");
        assert_eq!(response.intent, Intent::Irrelevant);
        assert!(response.answer.contains("노인복지 정책 전문 상담 AI"));
    }

    #[tokio::test]
    async fn welfare_question_without_documents_degrades_gracefully() {
        let service = service_with(Vec::new()).await;
        let response = service
            .answer("기초연금 신청 방법", None)
            .await
            .expect("response");
        assert_eq!(response.intent, Intent::WelfareInquiry);
        assert_eq!(response.confidence, Confidence::Low);
        assert_eq!(response.method.as_deref(), Some(METHOD_NO_DOCUMENTS));
        assert!(response.answer.contains("찾지 못했습니다"));
        assert!(response.answer.contains("129"));
    }

    #[tokio::test]
    async fn welfare_question_yields_a_grounded_template_answer() {
        let service = service_with(vec![
            (PENSION_CHUNK, "기초연금_안내.pdf", "전국"),
            (REGIONAL_CHUNK, "경북_교통비.pdf", "경북"),
        ])
        .await;

        let response = service
            .answer("기초연금 신청 방법이 궁금합니다", Some("경상북도"))
            .await
            .expect("response");

        assert_eq!(response.intent, Intent::WelfareInquiry);
        assert_eq!(response.confidence, Confidence::Medium);
        assert_eq!(
            response.method.as_deref(),
            Some(METHOD_TEMPLATE_FALLBACK)
        );
        // Without a generation client both variants are the template.
        assert_eq!(
            response.answer_pre_generation,
            response.answer_post_generation
        );
        assert!(response.answer.contains("기초연금"));
        assert!(response.answer.contains("보건복지상담센터: 129"));
        assert!(!response.sources.is_empty());
        assert_eq!(response.sources[0].filename, "기초연금_안내.pdf");
        assert!(response.context_used.is_some());
    }

    #[tokio::test]
    async fn fixed_seed_makes_region_sampling_repeatable() {
        // Distinct content prefixes so both documents survive dedup.
        let service_a = service_with(vec![
            (REGIONAL_CHUNK, "경북_교통비.pdf", "경북"),
            (
                "지원대상: 부산 거주 만 65세 이상 어르신에게 목욕 이용권을 지급하는 정책 지원",
                "부산_목욕.pdf",
                "부산",
            ),
        ])
        .await;
        let service_b = service_with(vec![
            (REGIONAL_CHUNK, "경북_교통비.pdf", "경북"),
            (
                "지원대상: 부산 거주 만 65세 이상 어르신에게 목욕 이용권을 지급하는 정책 지원",
                "부산_목욕.pdf",
                "부산",
            ),
        ])
        .await;

        let answer_a = service_a
            .answer("어르신 지원 정책 알려주세요", None)
            .await
            .expect("response")
            .answer;
        let answer_b = service_b
            .answer("어르신 지원 정책 알려주세요", None)
            .await
            .expect("response")
            .answer;

        assert_eq!(answer_a, answer_b);
    }
}
