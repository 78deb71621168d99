//! Clew Curator 批处理
//!
//! 启动: cargo run --bin clew-curator
//! 对整份目录做一次保鲜检查并写回；失败率超过告警阈值时以非零码退出，便于调度器告警。

use std::path::PathBuf;

use anyhow::Context;
use clew::config::load_config;
use clew::curator::Curator;
use clew::observability;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::var("CLEW_CONFIG").ok().map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;
    tracing::info!(path = %cfg.catalog.path.display(), "Curator run starting");

    let curator = Curator::from_config(&cfg).context("Failed to build link verifier")?;
    let report = curator.run().await.context("Curation failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.failure_rate > cfg.curator.alert_failure_rate {
        std::process::exit(2);
    }
    Ok(())
}
