//! 业务错误类型与对外错误边界
//!
//! 每个 ClewError 都带有：面向用户的安全提示（user_message）、用于日志的技术描述（Display）、
//! 是否允许重试、对应的 HTTP 状态与严重级别。调用方（HTTP handler 等）可直接转成传输层响应。

use serde::Serialize;
use thiserror::Error;

/// 流水线中可能出现的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClewError {
    /// 调用方输入不合法（缺字段 / 空字段 / 超长）
    #[error("Validation error: {field} - {issue}")]
    Validation { field: String, issue: String },

    /// 目录不可达或损坏
    #[error("Resource load failed for domain={domain}: {details}")]
    ResourceLoad { domain: String, details: String },

    /// 领域内没有可推荐的资源（或全部校验失败）
    #[error("No resources found for domain={domain}")]
    NoResourcesFound { domain: String },

    /// LLM 调用超出时限
    #[error("LLM timeout: {operation} exceeded {timeout_secs}s")]
    LlmTimeout {
        operation: String,
        timeout_secs: u64,
    },

    /// LLM 调用被限流
    #[error("LLM throttling: rate limit exceeded")]
    LlmThrottled,

    /// LLM 输出未通过结构 / 长度校验
    #[error("Invalid LLM response in {operation}: {details}")]
    InvalidLlmResponse { operation: String, details: String },

    /// 超出画像修订次数上限
    #[error("Refinement limit exceeded: {limit}")]
    RefinementLimit { limit: u32 },

    /// 组件内部未预料的失败，由 Orchestrator 包装为 Service，不直接暴露给调用方
    #[error("Unexpected failure in {stage}: {details}")]
    Unexpected { stage: String, details: String },

    /// Orchestrator 包装后的通用错误
    #[error("{details}")]
    Service {
        user_message: String,
        details: String,
        status: u16,
    },
}

/// 严重级别：调用方据此决定日志级别与告警
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 调用方自身问题
    Client,
    /// 暂时性故障，重试可能成功
    Transient,
    /// 需要人工介入
    Fatal,
}

/// 对外错误响应体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retry_allowed: bool,
    pub status: u16,
    pub severity: Severity,
}

impl ClewError {
    pub fn validation(field: impl Into<String>, issue: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            issue: issue.into(),
        }
    }

    pub fn invalid_response(operation: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidLlmResponse {
            operation: operation.into(),
            details: details.into(),
        }
    }

    pub fn unexpected(stage: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Unexpected {
            stage: stage.into(),
            details: details.into(),
        }
    }

    /// 可展示给用户的提示，不含内部细节
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { field, issue } => format!("Please check your {field}: {issue}"),
            Self::ResourceLoad { .. } => "We're having trouble loading our resource directory. \
                Please try again in a few minutes."
                .to_string(),
            Self::NoResourcesFound { domain } => {
                format!("We don't have resources for '{domain}' yet. Please check back soon!")
            }
            Self::LlmTimeout { .. } => "That took longer than expected. Our AI is thinking hard! \
                Please try again in a moment."
                .to_string(),
            Self::LlmThrottled => "We're experiencing high traffic right now. \
                Please wait a moment and try again."
                .to_string(),
            Self::InvalidLlmResponse { .. } | Self::Unexpected { .. } => {
                "We encountered an error processing your request. Please try again.".to_string()
            }
            Self::RefinementLimit { limit } => format!(
                "You've reached the refinement limit ({limit} attempts). \
                Let's start over with a fresh assessment."
            ),
            Self::Service { user_message, .. } => user_message.clone(),
        }
    }

    /// 记录日志用的技术描述
    pub fn technical_message(&self) -> String {
        self.to_string()
    }

    pub fn retry_allowed(&self) -> bool {
        !matches!(
            self,
            Self::Validation { .. } | Self::NoResourcesFound { .. } | Self::RefinementLimit { .. }
        )
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::ResourceLoad { .. } => 503,
            Self::NoResourcesFound { .. } => 404,
            Self::LlmTimeout { .. } => 504,
            Self::LlmThrottled | Self::RefinementLimit { .. } => 429,
            Self::InvalidLlmResponse { .. } | Self::Unexpected { .. } => 500,
            Self::Service { status, .. } => *status,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Validation { .. } | Self::RefinementLimit { .. } => Severity::Client,
            Self::NoResourcesFound { .. } => Severity::Fatal,
            _ => Severity::Transient,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.user_message(),
            retry_allowed: self.retry_allowed(),
            status: self.http_status(),
            severity: self.severity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_flags_follow_taxonomy() {
        assert!(!ClewError::validation("goal", "empty").retry_allowed());
        assert!(!ClewError::NoResourcesFound {
            domain: "ai-foundations".into()
        }
        .retry_allowed());
        assert!(!ClewError::RefinementLimit { limit: 1 }.retry_allowed());

        assert!(ClewError::LlmThrottled.retry_allowed());
        assert!(ClewError::LlmTimeout {
            operation: "path_generation".into(),
            timeout_secs: 60
        }
        .retry_allowed());
        assert!(ClewError::invalid_response("profile_synthesis", "too short").retry_allowed());
        assert!(ClewError::ResourceLoad {
            domain: "x".into(),
            details: "io".into()
        }
        .retry_allowed());
    }

    #[test]
    fn test_user_message_hides_technical_details() {
        let err = ClewError::invalid_response("path_generation", "expected value at line 1");
        let resp = err.to_response();
        assert!(!resp.error.contains("line 1"));
        assert!(err.technical_message().contains("line 1"));
        assert_eq!(resp.status, 500);
        assert!(resp.retry_allowed);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ClewError::LlmThrottled.http_status(), 429);
        assert_eq!(
            ClewError::LlmTimeout {
                operation: "profile_synthesis".into(),
                timeout_secs: 30
            }
            .http_status(),
            504
        );
        assert_eq!(
            ClewError::NoResourcesFound { domain: "d".into() }.to_response().severity,
            Severity::Fatal
        );
    }
}
