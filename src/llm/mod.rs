//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod message;
pub mod mock;
pub mod openai;
pub mod tier;
pub mod traits;

use std::sync::Arc;

pub use message::{Message, Role};
pub use mock::{MockLlmClient, RecordedCall, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage, DEEPSEEK_BASE_URL};
pub use tier::ModelTier;
pub use traits::{LlmClient, LlmError};

use crate::config::AppConfig;

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock）
///
/// 客户端作为显式依赖注入 Navigator，不做全局单例。
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_deepseek_key = std::env::var("DEEPSEEK_API_KEY").is_ok();
    let has_openai_key = std::env::var("OPENAI_API_KEY").is_ok();

    match provider.as_str() {
        "mock" => {
            tracing::warn!("LLM provider set to mock, reasoning calls will degrade to fallbacks");
            Arc::new(MockLlmClient)
        }
        "deepseek" if has_deepseek_key || has_openai_key => {
            tracing::info!("Using DeepSeek LLM ({})", cfg.llm.profile.id);
            Arc::new(OpenAiClient::deepseek())
        }
        "openai" if has_openai_key => {
            tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.profile.id);
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                std::env::var("OPENAI_API_KEY").ok().as_deref(),
            ))
        }
        _ => {
            tracing::warn!(
                provider = %provider,
                "No API key set or provider unknown, using Mock LLM"
            );
            Arc::new(MockLlmClient)
        }
    }
}
