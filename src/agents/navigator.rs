//! Navigator：画像合成 / 修订与学习路径生成
//!
//! 每个推理调用返回 `Result<_, ClewError>`：
//! - 超时（tokio::time::timeout）→ LlmTimeout
//! - 限流信号 → LlmThrottled
//! - 输出过短 / JSON 不合法 / 结构不满足不变量 → InvalidLlmResponse
//!
//! `*_or_fallback` 系列由 RecoveryEngine 显式决定是否走确定性降级路径（模板画像、启发式路径、保留原画像），
//! 降级结果在日志中以 `degraded = true` 标记。Navigator 本身无状态，修订次数限制由 Orchestrator 负责。

use std::sync::Arc;
use std::time::Duration;

use crate::agents::path::{order_by_prerequisites, parse_learning_path, MIN_PATH_LEN};
use crate::agents::prompts::{
    learning_path_prompt, profile_prompt, refinement_prompt, NAVIGATOR_SYSTEM_PROMPT,
};
use crate::agents::text::fix_capitalization;
use crate::agents::{
    LearningPath, PathOrigin, PathStep, Profile, ProfileOrigin, VibeCheckResponses,
    MIN_PROFILE_CHARS,
};
use crate::catalog::Resource;
use crate::config::AppConfig;
use crate::core::recovery::{RecoveryAction, RecoveryEngine};
use crate::core::ClewError;
use crate::llm::{LlmClient, LlmError, Message, ModelTier};

const PROFILE_SYNTHESIS: &str = "profile_synthesis";
const PROFILE_REFINEMENT: &str = "profile_refinement";
const PATH_GENERATION: &str = "path_generation";

pub struct Navigator {
    llm: Arc<dyn LlmClient>,
    profile_tier: ModelTier,
    path_tier: ModelTier,
    profile_timeout: Duration,
    path_timeout: Duration,
    recovery: RecoveryEngine,
}

impl Navigator {
    pub fn new(llm: Arc<dyn LlmClient>, profile_tier: ModelTier, path_tier: ModelTier) -> Self {
        Self {
            llm,
            profile_tier,
            path_tier,
            profile_timeout: Duration::from_secs(30),
            path_timeout: Duration::from_secs(60),
            recovery: RecoveryEngine::new(),
        }
    }

    pub fn from_config(llm: Arc<dyn LlmClient>, cfg: &AppConfig) -> Self {
        Self::new(llm, cfg.llm.profile.clone(), cfg.llm.path.clone())
            .with_timeouts(cfg.llm.timeouts.profile(), cfg.llm.timeouts.path())
    }

    pub fn with_timeouts(mut self, profile: Duration, path: Duration) -> Self {
        self.profile_timeout = profile;
        self.path_timeout = path;
        self
    }

    /// 底层客户端累计的 (prompt, completion, total) token 数
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 一次带时限的推理调用；LLM 层错误映射为业务错误
    async fn reason(
        &self,
        operation: &str,
        prompt: String,
        tier: &ModelTier,
        timeout: Duration,
    ) -> Result<String, ClewError> {
        let messages = vec![Message::system(NAVIGATOR_SYSTEM_PROMPT), Message::user(prompt)];
        let timed_out = || ClewError::LlmTimeout {
            operation: operation.to_string(),
            timeout_secs: timeout.as_secs(),
        };

        match tokio::time::timeout(timeout, self.llm.complete(&messages, tier)).await {
            Err(_) => {
                tracing::error!(
                    operation,
                    "[agent:navigator] LLM call timed out after {:?}",
                    timeout
                );
                Err(timed_out())
            }
            Ok(Err(LlmError::RateLimited(msg))) => {
                tracing::error!(operation, error = %msg, "[agent:navigator] LLM throttling detected");
                Err(ClewError::LlmThrottled)
            }
            Ok(Err(LlmError::Timeout(msg))) => {
                tracing::error!(operation, error = %msg, "[agent:navigator] LLM timeout reported");
                Err(timed_out())
            }
            Ok(Err(LlmError::ApiError(msg))) => {
                tracing::error!(operation, error = %msg, "[agent:navigator] LLM call failed");
                Err(ClewError::unexpected(operation, msg))
            }
            Ok(Ok(text)) => {
                let (prompt_tokens, completion_tokens, total_tokens) = self.llm.token_usage();
                tracing::debug!(
                    operation,
                    prompt_tokens,
                    completion_tokens,
                    total_tokens,
                    "[agent:navigator] Cumulative token usage"
                );
                Ok(text.trim().to_string())
            }
        }
    }

    fn validated_profile(
        operation: &str,
        text: String,
        origin: ProfileOrigin,
    ) -> Result<Profile, ClewError> {
        let len = text.chars().count();
        if len < MIN_PROFILE_CHARS {
            return Err(ClewError::invalid_response(
                operation,
                format!("Response too short: {len} chars"),
            ));
        }
        Ok(Profile::new(fix_capitalization(&text), origin))
    }

    /// 由四项答案合成第二人称画像
    pub async fn synthesize_profile(
        &self,
        responses: &VibeCheckResponses,
    ) -> Result<Profile, ClewError> {
        responses.validate()?;
        tracing::info!("[agent:navigator] Synthesizing profile from Vibe Check");

        let text = self
            .reason(
                PROFILE_SYNTHESIS,
                profile_prompt(responses),
                &self.profile_tier,
                self.profile_timeout,
            )
            .await?;
        let profile = Self::validated_profile(PROFILE_SYNTHESIS, text, ProfileOrigin::Reasoned)?;
        tracing::info!("[agent:navigator] Profile synthesized: {} chars", profile.text.len());
        Ok(profile)
    }

    /// synthesize_profile 失败且可降级时返回模板画像
    pub async fn synthesize_profile_or_fallback(
        &self,
        responses: &VibeCheckResponses,
    ) -> Result<Profile, ClewError> {
        match self.synthesize_profile(responses).await {
            Ok(profile) => Ok(profile),
            Err(e) => match self.recovery.handle(&e) {
                RecoveryAction::Fallback => {
                    tracing::warn!(
                        degraded = true,
                        reason = %e,
                        "[agent:navigator] Using template profile"
                    );
                    Ok(self.fallback_profile(responses))
                }
                RecoveryAction::Propagate => Err(e),
            },
        }
    }

    /// 不调用 LLM，直接由答案拼出画像
    pub fn fallback_profile(&self, responses: &VibeCheckResponses) -> Profile {
        let clean = |s: &str| s.trim().trim_end_matches('.').to_string();
        let text = format!(
            "You're approaching AI from this starting point: {}. Your main goal is to {}, \
            and you learn best through {}. Given your background in {}, this path focuses on \
            resources that connect AI concepts to practical work in your world.",
            clean(&responses.skepticism).to_lowercase(),
            clean(&responses.goal).to_lowercase(),
            clean(&responses.learning_style).to_lowercase(),
            clean(&responses.background),
        );
        Profile::new(fix_capitalization(&text), ProfileOrigin::Template)
    }

    /// 按用户的自由文本修正修订画像；可被调用任意次
    pub async fn refine_profile(
        &self,
        original: &Profile,
        correction: &str,
    ) -> Result<Profile, ClewError> {
        if correction.trim().is_empty() {
            return Err(ClewError::validation("user_correction", "Cannot be empty"));
        }
        tracing::info!("[agent:navigator] Refining profile with user correction");

        let text = self
            .reason(
                PROFILE_REFINEMENT,
                refinement_prompt(&original.text, correction.trim()),
                &self.profile_tier,
                self.profile_timeout,
            )
            .await?;
        let profile = Self::validated_profile(PROFILE_REFINEMENT, text, ProfileOrigin::Refined)?;
        tracing::info!("[agent:navigator] Profile refined: {} chars", profile.text.len());
        Ok(profile)
    }

    /// refine_profile 失败且可降级时保留原画像，并附上说明
    pub async fn refine_profile_or_keep(
        &self,
        original: &Profile,
        correction: &str,
    ) -> Result<Profile, ClewError> {
        match self.refine_profile(original, correction).await {
            Ok(profile) => Ok(profile),
            Err(e) => match self.recovery.handle(&e) {
                RecoveryAction::Fallback => {
                    tracing::warn!(
                        degraded = true,
                        reason = %e,
                        "[agent:navigator] Refinement not applied, keeping original profile"
                    );
                    Ok(Profile {
                        text: original.text.clone(),
                        origin: ProfileOrigin::Unrefined,
                        note: Some(format!(
                            "We couldn't apply your correction automatically: \"{}\"",
                            correction.trim()
                        )),
                    })
                }
                RecoveryAction::Propagate => Err(e),
            },
        }
    }

    /// 从候选集中选择并排序 4-6 个资源
    pub async fn generate_learning_path(
        &self,
        profile: &Profile,
        resources: &[Resource],
    ) -> Result<LearningPath, ClewError> {
        let eligible = active_candidates(resources)?;
        tracing::info!(
            "[agent:navigator] Generating path from {} resources",
            eligible.len()
        );

        let text = self
            .reason(
                PATH_GENERATION,
                learning_path_prompt(&profile.text, &eligible),
                &self.path_tier,
                self.path_timeout,
            )
            .await?;

        let mut path = parse_learning_path(&text, &eligible, &fix_capitalization(&profile.text))
            .map_err(|e| {
                tracing::debug!(
                    raw = %text.chars().take(500).collect::<String>(),
                    "[agent:navigator] Rejected path response"
                );
                e
            })?;
        if path.approach_guidance.is_empty() {
            path.approach_guidance = default_guidance(&path.steps);
        }

        tracing::info!(
            "[agent:navigator] Path generated: {} resources, {} total hours",
            path.len(),
            path.total_hours
        );
        Ok(path)
    }

    /// generate_learning_path 失败且可降级时使用启发式路径；启发式也无法成立时上抛原错误
    pub async fn generate_learning_path_or_fallback(
        &self,
        profile: &Profile,
        resources: &[Resource],
    ) -> Result<LearningPath, ClewError> {
        match self.generate_learning_path(profile, resources).await {
            Ok(path) => Ok(path),
            Err(e) => match self.recovery.handle(&e) {
                RecoveryAction::Fallback => {
                    tracing::warn!(
                        degraded = true,
                        reason = %e,
                        "[agent:navigator] Using heuristic fallback path"
                    );
                    self.fallback_learning_path(profile, resources)
                        .map_err(|fallback_err| {
                            tracing::error!(
                                error = %fallback_err,
                                "[agent:navigator] Heuristic fallback failed"
                            );
                            e
                        })
                }
                RecoveryAction::Propagate => Err(e),
            },
        }
    }

    /// 启发式路径：按 (authority_tier, difficulty) 升序取前 4 个，选中项按难度由浅入深稳定排序，再按前置关系调整
    pub fn fallback_learning_path(
        &self,
        profile: &Profile,
        resources: &[Resource],
    ) -> Result<LearningPath, ClewError> {
        let mut eligible = active_candidates(resources)?;
        if eligible.len() < MIN_PATH_LEN {
            return Err(ClewError::invalid_response(
                PATH_GENERATION,
                format!(
                    "Heuristic fallback needs at least {MIN_PATH_LEN} candidates, got {}",
                    eligible.len()
                ),
            ));
        }

        eligible.sort_by(|a, b| {
            (a.authority_tier, &a.difficulty).cmp(&(b.authority_tier, &b.difficulty))
        });
        eligible.truncate(MIN_PATH_LEN);
        eligible.sort_by(|a, b| a.difficulty.cmp(&b.difficulty));
        let selected = order_by_prerequisites(eligible);

        let mut steps: Vec<PathStep> = Vec::with_capacity(selected.len());
        for (idx, resource) in selected.into_iter().enumerate() {
            let sequence_note = match steps.last() {
                None => "Start here".to_string(),
                Some(prev) => format!("Take after {}", prev.resource.name),
            };
            let justification = heuristic_justification(&resource);
            steps.push(PathStep {
                sequence: idx as u32 + 1,
                hours: resource.estimated_hours,
                resource,
                justification,
                sequence_note,
            });
        }
        let total_hours = steps.iter().map(|s| s.hours).sum();

        Ok(LearningPath {
            profile_summary: fix_capitalization(&profile.text),
            approach_guidance: default_guidance(&steps),
            steps,
            total_hours,
            origin: PathOrigin::Heuristic,
        })
    }
}

/// 只保留 active 候选；为空视为调用方错误
fn active_candidates(resources: &[Resource]) -> Result<Vec<Resource>, ClewError> {
    let eligible: Vec<Resource> = resources.iter().filter(|r| r.is_active()).cloned().collect();
    if eligible.is_empty() {
        return Err(ClewError::validation(
            "resources",
            "Candidate set has no active resources",
        ));
    }
    Ok(eligible)
}

fn heuristic_justification(resource: &Resource) -> String {
    let format = if resource.format.is_empty() {
        "resource"
    } else {
        resource.format.as_str()
    };
    let provider = if resource.provider.is_empty() {
        "a trusted provider"
    } else {
        resource.provider.as_str()
    };
    let what = if resource.description.trim().is_empty() {
        "a solid, free foundation for this stage of your path"
    } else {
        resource.description.trim().trim_end_matches('.')
    };
    format!("This {format} from {provider} offers {what}.")
}

fn default_guidance(steps: &[PathStep]) -> String {
    match steps.first() {
        Some(first) => format!(
            "Begin with {} to build your foundation, then work through the remaining resources \
            in order. Each one builds on the previous.",
            first.resource.name
        ),
        None => "Work through the resources in order.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Difficulty, ResourceStatus};
    use crate::llm::ScriptedLlmClient;

    const GOOD_PROFILE: &str = "you're curious about ai but haven't started yet. you want to build \
        things and you learn best with hands-on projects.";

    fn responses() -> VibeCheckResponses {
        VibeCheckResponses::new("Curious", "Build things", "Hands-on projects", "Engineering")
    }

    fn navigator(llm: ScriptedLlmClient) -> (Navigator, Arc<ScriptedLlmClient>) {
        let llm = Arc::new(llm);
        let nav = Navigator::new(
            llm.clone(),
            ModelTier::new("profile-model", 800, 0.7),
            ModelTier::new("path-model", 4000, 0.3),
        );
        (nav, llm)
    }

    fn catalog() -> Vec<Resource> {
        let specs = [
            ("adv", 1, Difficulty::Advanced, 20),
            ("beg-t2", 2, Difficulty::Beginner, 8),
            ("beg-t1", 1, Difficulty::Beginner, 6),
            ("int-t1", 1, Difficulty::Intermediate, 12),
            ("beg-t3", 3, Difficulty::Beginner, 4),
        ];
        specs
            .iter()
            .map(|(id, tier, diff, hours)| {
                let mut r = Resource::new(*id, format!("Course {id}"), format!("https://{id}.example"));
                r.authority_tier = *tier;
                r.difficulty = diff.clone();
                r.estimated_hours = *hours;
                r
            })
            .collect()
    }

    #[tokio::test]
    async fn test_synthesize_profile_fixes_capitalization() {
        let (nav, llm) = navigator(ScriptedLlmClient::new().with_reply(GOOD_PROFILE));
        let profile = nav.synthesize_profile(&responses()).await.unwrap();
        assert!(profile.text.starts_with("You're curious about AI"));
        assert_eq!(profile.origin, ProfileOrigin::Reasoned);
        assert_eq!(llm.calls()[0].tier.id, "profile-model");
        assert!(llm.calls()[0].prompt.contains("Hands-on projects"));
    }

    #[tokio::test]
    async fn test_token_usage_accumulates_across_calls() {
        let (nav, _) = navigator(
            ScriptedLlmClient::new()
                .with_reply(GOOD_PROFILE)
                .with_reply(GOOD_PROFILE),
        );
        assert_eq!(nav.token_usage(), (0, 0, 0));

        nav.synthesize_profile(&responses()).await.unwrap();
        let (prompt, completion, total) = nav.token_usage();
        let reply_tokens = GOOD_PROFILE.split_whitespace().count() as u64;
        assert!(prompt > 0);
        assert_eq!(completion, reply_tokens);
        assert_eq!(total, prompt + completion);

        let original = Profile::new(GOOD_PROFILE, ProfileOrigin::Reasoned);
        nav.refine_profile(&original, "more videos").await.unwrap();
        assert_eq!(nav.token_usage().1, 2 * reply_tokens);
    }

    #[tokio::test]
    async fn test_synthesize_rejects_short_output() {
        let (nav, _) = navigator(ScriptedLlmClient::new().with_reply("You rock."));
        assert!(matches!(
            nav.synthesize_profile(&responses()).await,
            Err(ClewError::InvalidLlmResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_synthesize_validates_before_calling_llm() {
        let (nav, llm) = navigator(ScriptedLlmClient::new().with_reply(GOOD_PROFILE));
        let mut r = responses();
        r.goal = "  ".into();
        assert!(matches!(
            nav.synthesize_profile_or_fallback(&r).await,
            Err(ClewError::Validation { .. })
        ));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_throttle_is_typed_and_not_masked_by_fallback() {
        let (nav, _) = navigator(
            ScriptedLlmClient::new().with_error(LlmError::RateLimited("429 Too Many Requests".into())),
        );
        assert_eq!(
            nav.synthesize_profile_or_fallback(&responses()).await,
            Err(ClewError::LlmThrottled)
        );
    }

    #[tokio::test]
    async fn test_profile_timeout() {
        let (nav, _) = navigator(
            ScriptedLlmClient::new()
                .with_reply(GOOD_PROFILE)
                .with_delay(Duration::from_millis(500)),
        );
        let nav = nav.with_timeouts(Duration::from_millis(20), Duration::from_millis(20));
        assert!(matches!(
            nav.synthesize_profile(&responses()).await,
            Err(ClewError::LlmTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_profile_falls_back_to_template() {
        let (nav, _) = navigator(ScriptedLlmClient::new().with_reply("ok"));
        let profile = nav.synthesize_profile_or_fallback(&responses()).await.unwrap();
        assert_eq!(profile.origin, ProfileOrigin::Template);
        assert!(profile.is_degraded());
        assert!(profile.text.len() >= MIN_PROFILE_CHARS);
        assert!(profile.text.starts_with("You're"));
        assert!(profile.text.contains("Engineering"));
    }

    #[tokio::test]
    async fn test_refine_keeps_original_on_invalid_output() {
        let (nav, _) = navigator(ScriptedLlmClient::new().with_reply("short"));
        let original = Profile::new(GOOD_PROFILE, ProfileOrigin::Reasoned);
        let refined = nav
            .refine_profile_or_keep(&original, "I'm more of a reader")
            .await
            .unwrap();
        assert_eq!(refined.text, original.text);
        assert_eq!(refined.origin, ProfileOrigin::Unrefined);
        assert!(refined.note.unwrap().contains("I'm more of a reader"));
    }

    #[tokio::test]
    async fn test_refine_is_stateless() {
        let (nav, llm) = navigator(
            ScriptedLlmClient::new()
                .with_reply(GOOD_PROFILE)
                .with_reply(GOOD_PROFILE),
        );
        let original = Profile::new(GOOD_PROFILE, ProfileOrigin::Reasoned);
        let once = nav.refine_profile(&original, "more videos").await.unwrap();
        let twice = nav.refine_profile(&once, "even more videos").await.unwrap();
        assert_eq!(twice.origin, ProfileOrigin::Refined);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_heuristic_path_selects_by_tier_then_runs_easy_to_hard() {
        let (nav, _) = navigator(ScriptedLlmClient::new().with_reply("not json at all"));
        let profile = Profile::new(GOOD_PROFILE, ProfileOrigin::Reasoned);
        let path = nav
            .generate_learning_path_or_fallback(&profile, &catalog())
            .await
            .unwrap();
        assert_eq!(path.origin, PathOrigin::Heuristic);
        assert_eq!(path.resource_ids(), vec!["beg-t1", "beg-t2", "int-t1", "adv"]);
        assert_eq!(path.total_hours, 6 + 8 + 12 + 20);
        assert_eq!(path.steps[0].sequence_note, "Start here");
        assert!(path.steps.iter().all(|s| !s.justification.is_empty()));
    }

    #[tokio::test]
    async fn test_path_timeout_propagates_without_fallback() {
        let (nav, _) = navigator(
            ScriptedLlmClient::new()
                .with_reply("{}")
                .with_delay(Duration::from_millis(500)),
        );
        let nav = nav.with_timeouts(Duration::from_millis(20), Duration::from_millis(20));
        let profile = Profile::new(GOOD_PROFILE, ProfileOrigin::Reasoned);
        let err = nav
            .generate_learning_path_or_fallback(&profile, &catalog())
            .await
            .unwrap_err();
        assert!(matches!(err, ClewError::LlmTimeout { .. }));
        assert!(err.retry_allowed());
    }

    #[tokio::test]
    async fn test_fallback_impossible_keeps_original_error() {
        let (nav, _) = navigator(ScriptedLlmClient::new().with_reply("garbage"));
        let profile = Profile::new(GOOD_PROFILE, ProfileOrigin::Reasoned);
        let few = &catalog()[..3];
        match nav.generate_learning_path_or_fallback(&profile, few).await {
            Err(ClewError::InvalidLlmResponse { details, .. }) => {
                assert!(details.contains("Invalid JSON"))
            }
            other => panic!("Expected InvalidLlmResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inactive_candidates_are_never_selected() {
        let mut resources = catalog();
        resources[2].status = ResourceStatus::Degraded;
        let (nav, _) = navigator(ScriptedLlmClient::new());
        let profile = Profile::new(GOOD_PROFILE, ProfileOrigin::Reasoned);
        let path = nav.fallback_learning_path(&profile, &resources).unwrap();
        assert!(!path.resource_ids().contains(&"beg-t1"));
    }
}
