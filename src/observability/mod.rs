//! 可观测性：日志初始化与 Curator 指标
//!
//! 指标以结构化 tracing 事件发布（target = `clew::metrics`），由日志管道转发到监控后端。

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::curator::CurationReport;

pub const METRICS_TARGET: &str = "clew::metrics";

/// 日志写 stderr（stdout 留给 JSON 输出）：默认 info，可通过 RUST_LOG 覆盖；重复初始化时静默忽略
pub fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn emit_curator_metrics(report: &CurationReport) {
    tracing::info!(
        target: METRICS_TARGET,
        namespace = "Clew/Curator",
        resource_failure_rate = report.failure_rate,
        failed_resources = report.failed_resources as u64,
        total_resources = report.total_resources as u64,
        "ResourceFailureRate"
    );
}
