//! Clew - AI 学习资源个性化推荐管线
//!
//! 模块划分：
//! - **agents**: Scout（候选收集与链接抽查）、Navigator（画像与学习路径推理）
//! - **catalog**: 资源目录模型、存储与按领域加载
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、恢复决策、编排器
//! - **curator**: 批量保鲜检查与状态机
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: tracing 初始化与保鲜指标
//! - **tools**: 链接校验器

pub mod agents;
pub mod catalog;
pub mod config;
pub mod core;
pub mod curator;
pub mod llm;
pub mod observability;
pub mod tools;
