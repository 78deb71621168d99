//! 目录数据模型：Resource / ResourceStatus / Difficulty / Directory
//!
//! 目录是单个 JSON 文档。未识别的字段通过 `extra` 原样保留，Curator 读改写时不会丢失。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 新鲜度状态：active → degraded → stale → dead，严重度递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    #[default]
    Active,
    Degraded,
    Stale,
    Dead,
}

impl ResourceStatus {
    /// 校验失败时前进一步；dead 保持不变
    pub fn advance_on_failure(self) -> Self {
        match self {
            Self::Active => Self::Degraded,
            Self::Degraded => Self::Stale,
            Self::Stale | Self::Dead => Self::Dead,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Stale => "stale",
            Self::Dead => "dead",
        }
    }
}

/// 难度，按 beginner < intermediate < advanced 排序；无法识别的取值排在最后，原文保留
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Unknown(String),
}

impl Difficulty {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for Difficulty {
    fn from(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "beginner" => Self::Beginner,
            "intermediate" => Self::Intermediate,
            "advanced" => Self::Advanced,
            _ => Self::Unknown(raw.to_string()),
        }
    }
}

impl Serialize for Difficulty {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

fn default_authority_tier() -> u8 {
    3
}

/// 可推荐的学习资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(alias = "title")]
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub provider_url: String,
    #[serde(default)]
    pub resource_url: String,
    /// 为空时取目录级 domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// 1 为最权威
    #[serde(default = "default_authority_tier")]
    pub authority_tier: u8,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub estimated_hours: u32,
    #[serde(default)]
    pub free_model: String,
    /// 前置资源 id
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub best_for: String,
    #[serde(default)]
    pub status: ResourceStatus,
    #[serde(default)]
    pub last_verified: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    /// 最小构造，其余字段取默认值
    pub fn new(id: impl Into<String>, name: impl Into<String>, resource_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: String::new(),
            provider_url: String::new(),
            resource_url: resource_url.into(),
            domain: None,
            authority_tier: default_authority_tier(),
            difficulty: Difficulty::default(),
            format: String::new(),
            estimated_hours: 0,
            free_model: String::new(),
            prerequisites: Vec::new(),
            tags: Vec::new(),
            description: String::new(),
            best_for: String::new(),
            status: ResourceStatus::Active,
            last_verified: None,
            extra: Map::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ResourceStatus::Active
    }

    /// 资源所属领域：记录级优先，其次目录级
    pub fn effective_domain<'a>(&'a self, directory_domain: &'a str) -> &'a str {
        self.domain.as_deref().unwrap_or(directory_domain)
    }
}

fn default_directory_domain() -> String {
    "ai-foundations".to_string()
}

/// 目录文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_directory_domain")]
    pub domain: String,
    #[serde(default)]
    pub last_curated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Directory {
    pub fn new(domain: impl Into<String>, resources: Vec<Resource>) -> Self {
        Self {
            version: None,
            domain: domain.into(),
            last_curated: None,
            resources,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_advances_one_step() {
        assert_eq!(ResourceStatus::Active.advance_on_failure(), ResourceStatus::Degraded);
        assert_eq!(ResourceStatus::Degraded.advance_on_failure(), ResourceStatus::Stale);
        assert_eq!(ResourceStatus::Stale.advance_on_failure(), ResourceStatus::Dead);
        assert_eq!(ResourceStatus::Dead.advance_on_failure(), ResourceStatus::Dead);
    }

    #[test]
    fn test_difficulty_ordering_and_unknown() {
        assert!(Difficulty::Beginner < Difficulty::Intermediate);
        assert!(Difficulty::Intermediate < Difficulty::Advanced);
        assert_eq!(Difficulty::from("Advanced"), Difficulty::Advanced);
        let d: Difficulty = serde_json::from_str("\"expert-ish\"").unwrap();
        assert_eq!(d, Difficulty::Unknown("expert-ish".into()));
        assert!(Difficulty::Advanced < d);
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"expert-ish\"");
    }

    #[test]
    fn test_resource_keeps_unknown_fields() {
        let raw = r#"{
            "id": "r1",
            "title": "Elements of AI",
            "resource_url": "https://example.org/eoai",
            "status": "degraded",
            "curator_notes": "checked by hand"
        }"#;
        let r: Resource = serde_json::from_str(raw).unwrap();
        assert_eq!(r.name, "Elements of AI");
        assert_eq!(r.status, ResourceStatus::Degraded);
        assert_eq!(r.authority_tier, 3);

        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["curator_notes"], "checked by hand");
        assert_eq!(back["status"], "degraded");
    }

    #[test]
    fn test_effective_domain_falls_back_to_directory() {
        let mut r = Resource::new("r1", "Intro", "https://example.org");
        assert_eq!(r.effective_domain("ai-foundations"), "ai-foundations");
        r.domain = Some("ml-ops".into());
        assert_eq!(r.effective_domain("ai-foundations"), "ml-ops");
    }
}
