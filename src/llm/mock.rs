//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! - MockLlmClient：固定返回一句无推理内容的占位文本，Navigator 会据此走降级路径
//! - ScriptedLlmClient：按顺序回放预置回复或错误，可注入延迟，并记录每次调用的 prompt 与档位

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, Message, ModelTier, Role, TokenUsage};

/// 离线占位客户端
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _messages: &[Message], tier: &ModelTier) -> Result<String, LlmError> {
        Ok(format!("(mock {} reply)", tier.id))
    }
}

/// 一次被记录的调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// 最后一条 User 消息
    pub prompt: String,
    pub tier: ModelTier,
}

/// 回放客户端：队列耗尽后返回 ApiError
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    /// 按空白分词估算的 token 数
    usage: TokenUsage,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    pub fn with_error(self, err: LlmError) -> Self {
        self.push(Err(err));
        self
    }

    /// 每次回复前等待，用于触发调用方超时
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(&self, reply: Result<String, LlmError>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(reply);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

fn estimate_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn complete(&self, messages: &[Message], tier: &ModelTier) -> Result<String, LlmError> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.clone())
            .unwrap_or_default();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                prompt,
                tier: tier.clone(),
            });
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| Err(LlmError::ApiError("no scripted reply left".to_string())));
        if let Ok(text) = &reply {
            let prompt_tokens: u64 = messages.iter().map(|m| estimate_tokens(&m.content)).sum();
            self.usage.add(prompt_tokens, estimate_tokens(text));
        }
        reply
    }
}
