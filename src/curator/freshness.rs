//! 保鲜状态机：对目录中每个资源做一次校验并推进状态
//!
//! - 校验通过 → active（无论之前处于哪个状态）
//! - 校验失败 → 从当前状态前进一步；dead 保持 dead
//! - 校验器报错 → 计为 error，状态不变
//!
//! 三种情况都会刷新 last_verified；单个资源出错不会中断整批。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{Directory, Resource, ResourceStatus};
use crate::tools::{LinkVerifier, VerifyError};

/// 一次保鲜检查后各状态的计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurationStats {
    pub active: usize,
    pub degraded: usize,
    pub stale: usize,
    pub dead: usize,
    pub errors: usize,
}

impl CurationStats {
    fn record(&mut self, status: ResourceStatus) {
        match status {
            ResourceStatus::Active => self.active += 1,
            ResourceStatus::Degraded => self.degraded += 1,
            ResourceStatus::Stale => self.stale += 1,
            ResourceStatus::Dead => self.dead += 1,
        }
    }
}

/// 单个资源的状态迁移
pub fn apply_verification(
    resource: &mut Resource,
    outcome: &Result<bool, VerifyError>,
    now: DateTime<Utc>,
) {
    match outcome {
        Ok(true) => resource.status = ResourceStatus::Active,
        Ok(false) => resource.status = resource.status.advance_on_failure(),
        Err(_) => {}
    }
    resource.last_verified = Some(now);
}

/// 对整份目录做保鲜检查，返回新目录与统计
pub async fn check_all(
    mut directory: Directory,
    verifier: &dyn LinkVerifier,
    now: DateTime<Utc>,
) -> (Directory, CurationStats) {
    let mut stats = CurationStats::default();
    tracing::info!(
        "[curator] Starting freshness check for {} resources",
        directory.resources.len()
    );

    for resource in directory.resources.iter_mut() {
        let outcome = verifier.verify(&resource.resource_url).await;
        let before = resource.status;
        apply_verification(resource, &outcome, now);

        match &outcome {
            Err(e) => {
                stats.errors += 1;
                tracing::warn!(
                    resource_id = %resource.id,
                    error = %e,
                    "[curator] Error checking resource"
                );
            }
            Ok(_) => {
                stats.record(resource.status);
                if before != resource.status {
                    tracing::info!(
                        resource_id = %resource.id,
                        from = before.as_str(),
                        to = resource.status.as_str(),
                        "[curator] Status changed"
                    );
                }
            }
        }
    }

    directory.last_curated = Some(now);
    tracing::info!(?stats, "[curator] Freshness check complete");
    (directory, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{StaticLinkVerifier, StubOutcome};

    fn resource(id: &str, status: ResourceStatus) -> Resource {
        let mut r = Resource::new(id, id, format!("https://{id}.example"));
        r.status = status;
        r
    }

    #[test]
    fn test_failure_walks_one_step_at_a_time() {
        let now = Utc::now();
        let mut r = resource("r", ResourceStatus::Active);
        let expected = [
            ResourceStatus::Degraded,
            ResourceStatus::Stale,
            ResourceStatus::Dead,
            ResourceStatus::Dead,
            ResourceStatus::Dead,
        ];
        for want in expected {
            apply_verification(&mut r, &Ok(false), now);
            assert_eq!(r.status, want);
        }
    }

    #[test]
    fn test_success_resets_from_any_state() {
        let now = Utc::now();
        for start in [
            ResourceStatus::Active,
            ResourceStatus::Degraded,
            ResourceStatus::Stale,
            ResourceStatus::Dead,
        ] {
            let mut r = resource("r", start);
            apply_verification(&mut r, &Ok(true), now);
            assert_eq!(r.status, ResourceStatus::Active);
            assert_eq!(r.last_verified, Some(now));
        }
    }

    #[test]
    fn test_error_keeps_status_but_stamps_time() {
        let now = Utc::now();
        let mut r = resource("r", ResourceStatus::Stale);
        apply_verification(&mut r, &Err(VerifyError::Unexpected("boom".into())), now);
        assert_eq!(r.status, ResourceStatus::Stale);
        assert_eq!(r.last_verified, Some(now));
    }

    #[tokio::test]
    async fn test_check_all_counts_and_stamps() {
        let directory = Directory::new(
            "ai-foundations",
            vec![
                resource("ok", ResourceStatus::Degraded),
                resource("bad", ResourceStatus::Active),
                resource("gone", ResourceStatus::Dead),
                resource("flaky", ResourceStatus::Active),
            ],
        );
        let verifier = StaticLinkVerifier::new(StubOutcome::Dead)
            .with("https://ok.example", StubOutcome::Live)
            .with("https://flaky.example", StubOutcome::Error("reset".into()));
        let now = Utc::now();

        let (updated, stats) = check_all(directory, &verifier, now).await;
        let statuses: Vec<ResourceStatus> = updated.resources.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ResourceStatus::Active,
                ResourceStatus::Degraded,
                ResourceStatus::Dead,
                ResourceStatus::Active,
            ]
        );
        assert_eq!(
            stats,
            CurationStats {
                active: 1,
                degraded: 1,
                stale: 0,
                dead: 1,
                errors: 1
            }
        );
        assert!(updated.resources.iter().all(|r| r.last_verified == Some(now)));
        assert_eq!(updated.last_curated, Some(now));
    }
}
