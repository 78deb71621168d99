//! Vibe Check 输入与学习者画像

use serde::{Deserialize, Serialize};

use crate::core::ClewError;

/// 四个必答的分类问题；仅存在于单次请求内，不做持久化
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VibeCheckResponses {
    #[serde(default)]
    pub skepticism: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub learning_style: String,
    #[serde(default, alias = "context")]
    pub background: String,
}

impl VibeCheckResponses {
    pub fn new(
        skepticism: impl Into<String>,
        goal: impl Into<String>,
        learning_style: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        Self {
            skepticism: skepticism.into(),
            goal: goal.into(),
            learning_style: learning_style.into(),
            background: background.into(),
        }
    }

    fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("skepticism", self.skepticism.as_str()),
            ("goal", self.goal.as_str()),
            ("learning_style", self.learning_style.as_str()),
            ("background", self.background.as_str()),
        ]
    }

    /// 四项都必须非空（去除空白后）
    pub fn validate(&self) -> Result<(), ClewError> {
        let empty: Vec<&str> = self
            .fields()
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if empty.is_empty() {
            Ok(())
        } else {
            Err(ClewError::validation(
                "vibe_check_responses",
                format!("Empty fields not allowed: {}", empty.join(", ")),
            ))
        }
    }
}

/// 画像来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOrigin {
    /// LLM 合成
    Reasoned,
    /// LLM 按用户修正修订
    Refined,
    /// 降级：由答案直接套模板
    Template,
    /// 降级：修订失败，保留原画像
    Unrefined,
}

/// 画像合法的最小长度
pub const MIN_PROFILE_CHARS: usize = 50;

/// 学习者画像
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub text: String,
    pub origin: ProfileOrigin,
    /// 修订未能应用时给用户的说明
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Profile {
    pub fn new(text: impl Into<String>, origin: ProfileOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
            note: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.origin, ProfileOrigin::Template | ProfileOrigin::Unrefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_lists_empty_fields() {
        let r = VibeCheckResponses::new("Curious", " ", "Videos", "");
        match r.validate() {
            Err(ClewError::Validation { issue, .. }) => {
                assert!(issue.contains("goal"));
                assert!(issue.contains("background"));
                assert!(!issue.contains("skepticism"));
            }
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_context_alias_and_missing_fields() {
        let r: VibeCheckResponses = serde_json::from_str(
            r#"{"skepticism": "Skeptical", "goal": "Build things", "context": "Engineering"}"#,
        )
        .unwrap();
        assert_eq!(r.background, "Engineering");
        assert!(r.validate().is_err());
    }
}
