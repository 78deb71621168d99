//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CLEW__*` 覆盖（双下划线表示嵌套，如 `CLEW__LLM__PROVIDER=openai`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::llm::ModelTier;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub catalog: CatalogSection,
    pub verifier: VerifierSection,
    pub scout: ScoutSection,
    pub curator: CuratorSection,
    pub refinement: RefinementSection,
}

/// [app] 段：应用名、推荐所用的知识领域
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    pub domain: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            domain: "ai-foundations".to_string(),
        }
    }
}

/// [llm] 段：后端选择、按调用点区分的模型档位、超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai / deepseek / mock
    pub provider: String,
    pub base_url: Option<String>,
    /// 画像合成与修订使用的档位
    pub profile: ModelTier,
    /// 学习路径生成使用的档位
    pub path: ModelTier,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: None,
            profile: ModelTier::new("gpt-4o-mini", 1000, 0.7),
            path: ModelTier::new("gpt-4o-mini", 4000, 0.7),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub profile_secs: u64,
    pub path_secs: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            profile_secs: 30,
            path_secs: 60,
        }
    }
}

impl LlmTimeoutsSection {
    pub fn profile(&self) -> Duration {
        Duration::from_secs(self.profile_secs)
    }

    pub fn path(&self) -> Duration {
        Duration::from_secs(self.path_secs)
    }
}

/// [catalog] 段：目录文件位置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub path: PathBuf,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/directory.json"),
        }
    }
}

/// [verifier] 段：单次探测超时、重试次数、退避基数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifierSection {
    pub timeout_secs: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl Default for VerifierSection {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            retries: 2,
            backoff_ms: 1000,
            user_agent: "Clew/1.0 (resource-verification)".to_string(),
        }
    }
}

/// [scout] 段：是否在用户请求中做运行时链接抽查；失败率告警阈值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoutSection {
    /// 默认 false：信任 Curator 的定期校验结果
    pub verify_urls: bool,
    pub failure_warn_rate: f64,
}

impl Default for ScoutSection {
    fn default() -> Self {
        Self {
            verify_urls: false,
            failure_warn_rate: 0.3,
        }
    }
}

/// [curator] 段：批量校验的单链接超时与告警阈值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CuratorSection {
    pub verify_timeout_secs: u64,
    pub alert_failure_rate: f64,
}

impl Default for CuratorSection {
    fn default() -> Self {
        Self {
            verify_timeout_secs: 10,
            alert_failure_rate: 0.1,
        }
    }
}

/// [refinement] 段：画像修订次数上限与修正文本长度上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefinementSection {
    pub max_refinements: u32,
    pub max_correction_chars: usize,
}

impl Default for RefinementSection {
    fn default() -> Self {
        Self {
            max_refinements: 1,
            max_correction_chars: 200,
        }
    }
}

/// 从 config 目录加载配置，环境变量 CLEW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CLEW__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CLEW")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_limits() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.domain, "ai-foundations");
        assert_eq!(cfg.llm.timeouts.profile(), Duration::from_secs(30));
        assert_eq!(cfg.llm.timeouts.path(), Duration::from_secs(60));
        assert_eq!(cfg.verifier.timeout_secs, 5);
        assert_eq!(cfg.verifier.retries, 2);
        assert!(!cfg.scout.verify_urls);
        assert_eq!(cfg.refinement.max_refinements, 1);
        assert_eq!(cfg.refinement.max_correction_chars, 200);
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clew.toml");
        std::fs::write(
            &path,
            r#"
[app]
domain = "ml-ops"

[llm]
provider = "mock"

[llm.path]
id = "reasoner-large"
max_tokens = 5000
temperature = 0.2

[scout]
verify_urls = true
"#,
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.app.domain, "ml-ops");
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.path, ModelTier::new("reasoner-large", 5000, 0.2));
        assert!(cfg.scout.verify_urls);
        // 未出现的段保持默认
        assert_eq!(cfg.curator.verify_timeout_secs, 10);
    }
}
