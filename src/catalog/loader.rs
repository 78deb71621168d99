//! 目录加载：按领域与状态筛选候选资源

use std::sync::Arc;

use crate::catalog::{CatalogStore, Resource};
use crate::core::ClewError;

/// 读取目录并筛出 `domain` 下 status == active 的资源
///
/// 领域下没有可用资源时返回空列表，是否致命由调用方决定。
pub struct CatalogLoader {
    store: Arc<dyn CatalogStore>,
}

impl CatalogLoader {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, domain: &str) -> Result<Vec<Resource>, ClewError> {
        let directory = self.store.read().await.map_err(|e| ClewError::ResourceLoad {
            domain: domain.to_string(),
            details: e.to_string(),
        })?;

        let directory_domain = directory.domain.clone();
        let active: Vec<Resource> = directory
            .resources
            .into_iter()
            .filter(|r| r.effective_domain(&directory_domain) == domain && r.is_active())
            .collect();

        tracing::debug!(domain = %domain, "[catalog] {} active resources", active.len());
        Ok(active)
    }

    /// 按 id 查找单个资源（不看状态）
    pub async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>, ClewError> {
        let directory = self.store.read().await.map_err(|e| ClewError::ResourceLoad {
            domain: "*".to_string(),
            details: e.to_string(),
        })?;
        Ok(directory.resources.into_iter().find(|r| r.id == resource_id))
    }
}
