//! 编排器：一次用户交互内的调用顺序与错误翻译
//!
//! Vibe Check → Navigator 画像 →（可选一次修订）→ 确认后 Scout 收集候选 → Navigator 生成路径。
//! 带类型的错误原样上抛；组件内部未预料的失败（Unexpected）包装为 Service，只给出安全的提示并允许重试。
//! 编排器不持有会话状态，每次调用都从零构造结果。

use std::sync::Arc;
use std::time::Duration;

use crate::agents::{LearningPath, Navigator, Profile, Scout, VibeCheckResponses};
use crate::catalog::{CatalogLoader, FileCatalogStore};
use crate::config::AppConfig;
use crate::core::ClewError;
use crate::llm::LlmClient;
use crate::tools::HttpLinkVerifier;

/// 编排阶段，决定包装错误时的提示语与状态码
#[derive(Debug, Clone, Copy)]
enum Stage {
    VibeCheck,
    Refinement,
    Scout,
    PathGeneration,
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::VibeCheck => "vibe_check",
            Stage::Refinement => "refinement",
            Stage::Scout => "scout",
            Stage::PathGeneration => "path_generation",
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            Stage::VibeCheck | Stage::Refinement => {
                "We encountered an error generating your profile. Please try again or refresh the page."
            }
            Stage::Scout => {
                "We're having trouble loading our resource directory. Please try again in a few minutes."
            }
            Stage::PathGeneration => {
                "We encountered an error generating your learning path. Please try again."
            }
        }
    }

    fn status(&self) -> u16 {
        match self {
            Stage::Scout => 503,
            _ => 500,
        }
    }
}

pub struct Orchestrator {
    scout: Arc<Scout>,
    navigator: Arc<Navigator>,
    domain: String,
    verify_urls: bool,
    max_refinements: u32,
    max_correction_chars: usize,
}

impl Orchestrator {
    pub fn new(scout: Arc<Scout>, navigator: Arc<Navigator>, domain: impl Into<String>) -> Self {
        Self {
            scout,
            navigator,
            domain: domain.into(),
            verify_urls: false,
            max_refinements: 1,
            max_correction_chars: 200,
        }
    }

    pub fn with_verify_urls(mut self, verify_urls: bool) -> Self {
        self.verify_urls = verify_urls;
        self
    }

    pub fn with_refinement_limits(mut self, max_refinements: u32, max_correction_chars: usize) -> Self {
        self.max_refinements = max_refinements;
        self.max_correction_chars = max_correction_chars;
        self
    }

    /// 带类型的错误原样返回；Unexpected 包装为 Service
    fn translate(&self, stage: Stage, err: ClewError) -> ClewError {
        match err {
            ClewError::Unexpected { .. } => {
                tracing::error!(
                    stage = stage.name(),
                    error = %err,
                    "[orchestrator] Unexpected failure"
                );
                ClewError::Service {
                    user_message: stage.user_message().to_string(),
                    details: format!("Orchestrator: {} failed: {}", stage.name(), err),
                    status: stage.status(),
                }
            }
            typed => {
                tracing::warn!(
                    stage = stage.name(),
                    error = %typed,
                    retry_allowed = typed.retry_allowed(),
                    "[orchestrator] Stage failed"
                );
                typed
            }
        }
    }

    pub async fn process_vibe_check(
        &self,
        responses: &VibeCheckResponses,
    ) -> Result<Profile, ClewError> {
        tracing::info!("[orchestrator] Processing Vibe Check");
        responses.validate()?;

        let profile = self
            .navigator
            .synthesize_profile_or_fallback(responses)
            .await
            .map_err(|e| self.translate(Stage::VibeCheck, e))?;
        tracing::info!(
            degraded = profile.is_degraded(),
            "[orchestrator] Profile synthesized: {} chars",
            profile.text.len()
        );
        Ok(profile)
    }

    /// 修订次数已达上限时拒绝；由持有交互状态的外层调用
    pub fn ensure_refinement_allowed(&self, refinements_so_far: u32) -> Result<(), ClewError> {
        if refinements_so_far >= self.max_refinements {
            tracing::info!(
                refinements_so_far,
                "[orchestrator] Refinement limit reached, flow must restart"
            );
            return Err(ClewError::RefinementLimit {
                limit: self.max_refinements,
            });
        }
        Ok(())
    }

    pub async fn process_refinement(
        &self,
        original: &Profile,
        correction: &str,
    ) -> Result<Profile, ClewError> {
        tracing::info!("[orchestrator] Processing profile refinement");
        let correction = correction.trim();
        if correction.is_empty() {
            return Err(ClewError::validation("user_correction", "Cannot be empty"));
        }
        let len = correction.chars().count();
        if len > self.max_correction_chars {
            return Err(ClewError::validation(
                "user_correction",
                format!(
                    "Must be at most {} characters (got {len})",
                    self.max_correction_chars
                ),
            ));
        }

        let refined = self
            .navigator
            .refine_profile_or_keep(original, correction)
            .await
            .map_err(|e| self.translate(Stage::Refinement, e))?;
        tracing::info!(
            degraded = refined.is_degraded(),
            "[orchestrator] Profile refined: {} chars",
            refined.text.len()
        );
        Ok(refined)
    }

    /// Scout 完全完成（含校验）后才会调用 Navigator；Scout 失败直接短路
    pub async fn generate_briefing(&self, approved: &Profile) -> Result<LearningPath, ClewError> {
        tracing::info!("[orchestrator] Generating briefing");
        if approved.text.trim().is_empty() {
            return Err(ClewError::validation("profile", "Cannot be empty"));
        }

        let resources = self
            .scout
            .gather_resources(&self.domain, self.verify_urls)
            .await
            .map_err(|e| self.translate(Stage::Scout, e))?;
        if resources.is_empty() {
            return Err(ClewError::NoResourcesFound {
                domain: self.domain.clone(),
            });
        }
        tracing::info!("[orchestrator] Scout gathered {} resources", resources.len());

        let path = self
            .navigator
            .generate_learning_path_or_fallback(approved, &resources)
            .await
            .map_err(|e| self.translate(Stage::PathGeneration, e))?;
        tracing::info!(
            origin = ?path.origin,
            "[orchestrator] Navigator generated path with {} resources",
            path.len()
        );
        Ok(path)
    }
}

/// 按配置组装编排器：文件目录 + HEAD 校验器 + 注入的 LLM 客户端
pub fn build_orchestrator(cfg: &AppConfig, llm: Arc<dyn LlmClient>) -> anyhow::Result<Orchestrator> {
    let store = Arc::new(FileCatalogStore::new(&cfg.catalog.path));
    let verifier = HttpLinkVerifier::from_config(
        &cfg.verifier,
        Duration::from_secs(cfg.verifier.timeout_secs),
    )?;
    let scout = Scout::new(CatalogLoader::new(store))
        .with_verifier(Arc::new(verifier))
        .with_failure_warn_rate(cfg.scout.failure_warn_rate);
    let navigator = Navigator::from_config(llm, cfg);

    Ok(
        Orchestrator::new(Arc::new(scout), Arc::new(navigator), cfg.app.domain.clone())
            .with_verify_urls(cfg.scout.verify_urls)
            .with_refinement_limits(
                cfg.refinement.max_refinements,
                cfg.refinement.max_correction_chars,
            ),
    )
}
