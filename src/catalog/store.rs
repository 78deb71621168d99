//! 目录存储：整文档读写
//!
//! - FileCatalogStore：本地 JSON 文件；写入先落临时文件再 rename，读者不会看到半份文档
//! - InMemoryCatalogStore：测试与嵌入场景使用

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::catalog::Directory;

/// 存储层错误
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl CatalogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// 目录存储 trait：整份读取、整份替换
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn read(&self) -> Result<Directory, CatalogError>;

    async fn write(&self, directory: &Directory) -> Result<(), CatalogError>;
}

/// JSON 文件存储
#[derive(Debug, Clone)]
pub struct FileCatalogStore {
    path: PathBuf,
}

impl FileCatalogStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogStore for FileCatalogStore {
    async fn read(&self) -> Result<Directory, CatalogError> {
        let data = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CatalogError::io(&self.path, e))?;
        let directory: Directory = serde_json::from_str(&data)?;
        tracing::info!(
            path = %self.path.display(),
            version = directory.version.as_deref().unwrap_or("unknown"),
            "[catalog] Loaded directory with {} resources",
            directory.resources.len()
        );
        Ok(directory)
    }

    async fn write(&self, directory: &Directory) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| CatalogError::io(parent, e))?;
            }
        }
        let body = serde_json::to_string_pretty(directory)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| CatalogError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CatalogError::io(&self.path, e))?;
        tracing::info!(path = %self.path.display(), "[catalog] Directory written");
        Ok(())
    }
}

/// 内存存储，记录写入次数
#[derive(Debug)]
pub struct InMemoryCatalogStore {
    directory: RwLock<Directory>,
    writes: std::sync::atomic::AtomicUsize,
}

impl InMemoryCatalogStore {
    pub fn new(directory: Directory) -> Self {
        Self {
            directory: RwLock::new(directory),
            writes: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Directory {
        self.directory.read().await.clone()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn read(&self) -> Result<Directory, CatalogError> {
        Ok(self.directory.read().await.clone())
    }

    async fn write(&self, directory: &Directory) -> Result<(), CatalogError> {
        *self.directory.write().await = directory.clone();
        self.writes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
