//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient::complete（同步请求-响应，非流式）。
//! 失败统一为 LlmError；限流与超时从错误文本中识别，供 Navigator 映射为带类型的业务错误。

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use crate::llm::{Message, ModelTier};

/// LLM 调用失败的分类
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// 服务端限流（429 / throttling）
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 请求超时（客户端或服务端报告）
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// 其它 API 错误
    #[error("API error: {0}")]
    ApiError(String),
}

impl LlmError {
    /// 根据错误文本识别限流 / 超时信号，其余归为 ApiError
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("throttl")
            || lower.contains("rate limit")
            || lower.contains("rate_limit")
            || lower.contains("too many requests")
            || status_429().is_match(&lower)
        {
            LlmError::RateLimited(message)
        } else if lower.contains("timeout") || lower.contains("timed out") {
            LlmError::Timeout(message)
        } else {
            LlmError::ApiError(message)
        }
    }
}

/// 只认带状态上下文的 429（`status: 429`、`HTTP 429`、`code=429`），请求 id 或计数中的 429 不算
fn status_429() -> &'static Regex {
    static STATUS_429: OnceLock<Regex> = OnceLock::new();
    STATUS_429.get_or_init(|| {
        Regex::new(r"\b(status|code|http)(\s*code)?\s*[:=]?\s*429\b").expect("static regex")
    })
}

/// LLM 客户端 trait：以指定模型档位完成一次对话
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成，返回首条回复文本
    async fn complete(&self, messages: &[Message], tier: &ModelTier) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_throttle_signals() {
        assert!(matches!(
            LlmError::classify("ThrottlingException: slow down"),
            LlmError::RateLimited(_)
        ));
        assert!(matches!(
            LlmError::classify("HTTP 429 Too Many Requests"),
            LlmError::RateLimited(_)
        ));
        assert!(matches!(
            LlmError::classify("Rate limit reached for requests"),
            LlmError::RateLimited(_)
        ));
        assert!(matches!(
            LlmError::classify("upstream returned status: 429"),
            LlmError::RateLimited(_)
        ));
    }

    #[test]
    fn test_classify_ignores_incidental_429() {
        for msg in [
            "invalid request req_14291: bad model",
            "prompt has 429 tokens over the context limit",
            "max_tokens 4290 is too large",
        ] {
            assert!(
                matches!(LlmError::classify(msg), LlmError::ApiError(_)),
                "misclassified: {msg}"
            );
        }
    }

    #[test]
    fn test_classify_timeout_and_other() {
        assert!(matches!(
            LlmError::classify("operation timed out"),
            LlmError::Timeout(_)
        ));
        assert!(matches!(
            LlmError::classify("invalid api key"),
            LlmError::ApiError(_)
        ));
    }
}
