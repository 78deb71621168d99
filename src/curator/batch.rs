//! Curator 批处理入口：读目录 → check_all → 整份写回 → 发布指标 → 超阈值告警
//!
//! 全部更新在内存中完成后才写一次，不会出现部分写入。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{CatalogError, CatalogStore, FileCatalogStore, ResourceStatus};
use crate::config::AppConfig;
use crate::curator::freshness::{check_all, CurationStats};
use crate::observability;
use crate::tools::{HttpLinkVerifier, LinkVerifier, VerifyError};

/// 一次批处理的汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurationReport {
    pub total_resources: usize,
    /// 运行后 status != active 的资源数
    pub failed_resources: usize,
    /// failed / total，total 为 0 时为 0
    pub failure_rate: f64,
    pub stats: CurationStats,
    pub curated_at: DateTime<Utc>,
}

pub struct Curator {
    store: Arc<dyn CatalogStore>,
    verifier: Arc<dyn LinkVerifier>,
    alert_failure_rate: f64,
}

impl Curator {
    pub fn new(store: Arc<dyn CatalogStore>, verifier: Arc<dyn LinkVerifier>) -> Self {
        Self {
            store,
            verifier,
            alert_failure_rate: 0.1,
        }
    }

    /// 文件目录 + HEAD 校验器；单次探测时限取 [curator] 段，比 Scout 宽松
    pub fn from_config(cfg: &AppConfig) -> Result<Self, VerifyError> {
        let verifier = HttpLinkVerifier::from_config(
            &cfg.verifier,
            Duration::from_secs(cfg.curator.verify_timeout_secs),
        )?;
        Ok(Self::new(
            Arc::new(FileCatalogStore::new(&cfg.catalog.path)),
            Arc::new(verifier),
        )
        .with_alert_failure_rate(cfg.curator.alert_failure_rate))
    }

    pub fn with_alert_failure_rate(mut self, rate: f64) -> Self {
        self.alert_failure_rate = rate;
        self
    }

    pub async fn run(&self) -> Result<CurationReport, CatalogError> {
        tracing::info!("[curator] Batch started");
        let directory = self.store.read().await?;

        let now = Utc::now();
        let (updated, stats) = check_all(directory, self.verifier.as_ref(), now).await;

        let total = updated.resources.len();
        let failed = updated
            .resources
            .iter()
            .filter(|r| r.status != ResourceStatus::Active)
            .count();
        let failure_rate = if total == 0 {
            0.0
        } else {
            failed as f64 / total as f64
        };

        self.store.write(&updated).await?;

        let report = CurationReport {
            total_resources: total,
            failed_resources: failed,
            failure_rate,
            stats,
            curated_at: now,
        };
        observability::emit_curator_metrics(&report);

        if failure_rate > self.alert_failure_rate {
            tracing::error!(
                failed,
                total,
                "[curator] ALERT: failure rate {:.1}% exceeds {:.0}% threshold",
                failure_rate * 100.0,
                self.alert_failure_rate * 100.0
            );
        }
        Ok(report)
    }
}
