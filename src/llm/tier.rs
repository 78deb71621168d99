//! 模型档位：每个调用点显式选择的推理模型配置
//!
//! 画像合成与路径生成各持有一个 ModelTier，由配置 `[llm.profile]` / `[llm.path]` 决定，
//! 不在客户端内部隐式推断。

use serde::Deserialize;

/// 模型档位：模型 id、输出 token 上限、采样温度
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelTier {
    pub id: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_temperature() -> f32 {
    0.7
}

impl ModelTier {
    pub fn new(id: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            id: id.into(),
            max_tokens,
            temperature,
        }
    }
}

impl Default for ModelTier {
    fn default() -> Self {
        Self::new("gpt-4o-mini", default_max_tokens(), default_temperature())
    }
}
