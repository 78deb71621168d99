//! Scout：加载候选资源并（可选）做运行时链接抽查
//!
//! 降级策略：校验器返回 Err 视为无法判定，资源照常保留（Curator 在上一个保鲜周期内已校验过）；
//! 返回 false 则剔除并计入失败。失败率超过阈值只告警；全部失败时报 NoResourcesFound。

use std::sync::Arc;

use crate::catalog::{CatalogLoader, Resource};
use crate::core::ClewError;
use crate::tools::LinkVerifier;

pub struct Scout {
    loader: CatalogLoader,
    verifier: Option<Arc<dyn LinkVerifier>>,
    failure_warn_rate: f64,
}

impl Scout {
    pub fn new(loader: CatalogLoader) -> Self {
        Self {
            loader,
            verifier: None,
            failure_warn_rate: 0.3,
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn LinkVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_failure_warn_rate(mut self, rate: f64) -> Self {
        self.failure_warn_rate = rate;
        self
    }

    pub async fn gather_resources(
        &self,
        domain: &str,
        verify_urls: bool,
    ) -> Result<Vec<Resource>, ClewError> {
        tracing::info!(domain, verify_urls, "[agent:scout] Loading resources");

        let resources = self.loader.load(domain).await.map_err(|e| {
            tracing::error!(domain, error = %e, "[agent:scout] Failed to load resources");
            match e {
                ClewError::ResourceLoad { .. } => e,
                other => ClewError::ResourceLoad {
                    domain: domain.to_string(),
                    details: other.to_string(),
                },
            }
        })?;

        if resources.is_empty() {
            tracing::warn!(domain, "[agent:scout] No resources found");
            return Err(ClewError::NoResourcesFound {
                domain: domain.to_string(),
            });
        }
        tracing::info!("[agent:scout] Loaded {} active resources", resources.len());

        let verifier = match (&self.verifier, verify_urls) {
            (Some(v), true) => v,
            (None, true) => {
                tracing::warn!("[agent:scout] URL verification requested but no verifier configured");
                return Ok(resources);
            }
            (_, false) => return Ok(resources),
        };

        let total = resources.len();
        let mut failed = 0usize;
        let mut verified = Vec::with_capacity(total);
        for resource in resources {
            match verifier.verify(&resource.resource_url).await {
                Ok(true) => verified.push(resource),
                Ok(false) => {
                    failed += 1;
                    tracing::warn!(
                        resource_id = %resource.id,
                        url = %resource.resource_url,
                        "[agent:scout] Resource failed verification"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        resource_id = %resource.id,
                        error = %e,
                        "[agent:scout] Verification error, including anyway"
                    );
                    verified.push(resource);
                }
            }
        }

        let failure_rate = failed as f64 / total as f64;
        if failure_rate > self.failure_warn_rate {
            tracing::warn!(
                failed,
                total,
                "[agent:scout] High failure rate: {:.0}% of resources failed verification",
                failure_rate * 100.0
            );
        }

        if verified.is_empty() {
            tracing::error!(domain, "[agent:scout] All resources failed verification");
            return Err(ClewError::NoResourcesFound {
                domain: domain.to_string(),
            });
        }

        tracing::info!(
            "[agent:scout] Verification complete: {}/{} resources passed",
            verified.len(),
            total
        );
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Directory, FileCatalogStore, InMemoryCatalogStore};
    use crate::tools::{StaticLinkVerifier, StubOutcome};

    fn scout_with(resources: Vec<Resource>, verifier: StaticLinkVerifier) -> Scout {
        let store = InMemoryCatalogStore::new(Directory::new("ai-foundations", resources));
        Scout::new(CatalogLoader::new(Arc::new(store))).with_verifier(Arc::new(verifier))
    }

    fn three() -> Vec<Resource> {
        vec![
            Resource::new("a", "A", "https://a.example"),
            Resource::new("b", "B", "https://b.example"),
            Resource::new("c", "C", "https://c.example"),
        ]
    }

    fn ids(rs: &[Resource]) -> Vec<&str> {
        rs.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_failed_resource_excluded_order_kept() {
        let v = StaticLinkVerifier::new(StubOutcome::Live).with("https://b.example", StubOutcome::Dead);
        let out = scout_with(three(), v)
            .gather_resources("ai-foundations", true)
            .await
            .unwrap();
        assert_eq!(ids(&out), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_verifier_error_is_forgiven() {
        let v = StaticLinkVerifier::new(StubOutcome::Dead)
            .with("https://c.example", StubOutcome::Error("tls handshake".into()));
        let out = scout_with(three(), v)
            .gather_resources("ai-foundations", true)
            .await
            .unwrap();
        assert_eq!(ids(&out), vec!["c"]);
    }

    #[tokio::test]
    async fn test_all_dead_is_no_resources_found() {
        let v = StaticLinkVerifier::new(StubOutcome::Dead);
        let err = scout_with(three(), v)
            .gather_resources("ai-foundations", true)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ClewError::NoResourcesFound {
                domain: "ai-foundations".into()
            }
        );
    }

    #[tokio::test]
    async fn test_skip_verification_trusts_status() {
        let v = StaticLinkVerifier::new(StubOutcome::Dead);
        let out = scout_with(three(), v)
            .gather_resources("ai-foundations", false)
            .await
            .unwrap();
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_domain_is_no_resources_found() {
        let v = StaticLinkVerifier::new(StubOutcome::Live);
        let err = scout_with(three(), v)
            .gather_resources("robotics", true)
            .await
            .unwrap_err();
        assert!(matches!(err, ClewError::NoResourcesFound { domain } if domain == "robotics"));
    }

    #[tokio::test]
    async fn test_unreadable_catalog_is_resource_load_error() {
        let scout = Scout::new(CatalogLoader::new(Arc::new(FileCatalogStore::new(
            "/nonexistent/clew/directory.json",
        ))));
        let err = scout.gather_resources("ai-foundations", false).await.unwrap_err();
        assert!(matches!(err, ClewError::ResourceLoad { .. }));
        assert!(err.retry_allowed());
    }
}
