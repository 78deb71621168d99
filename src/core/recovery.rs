//! 错误恢复引擎
//!
//! 根据 ClewError 类型决定推理调用失败后的动作：走确定性降级路径，还是原样上抛。

use crate::core::ClewError;

/// 恢复引擎给出的建议动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 用模板画像 / 启发式路径等本地降级结果替代 LLM 输出
    Fallback,
    /// 原样上抛，由调用方决定是否重试
    Propagate,
}

/// 降级选择：只有输出无效或未预料的失败才降级；超时与限流必须让调用方看到
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &ClewError) -> RecoveryAction {
        match err {
            ClewError::InvalidLlmResponse { .. } | ClewError::Unexpected { .. } => {
                RecoveryAction::Fallback
            }
            ClewError::LlmTimeout { .. } | ClewError::LlmThrottled => RecoveryAction::Propagate,
            _ => RecoveryAction::Propagate,
        }
    }
}
