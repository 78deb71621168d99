//! 目录层：资源模型、整文档存储、按领域加载

pub mod loader;
pub mod model;
pub mod store;

pub use loader::CatalogLoader;
pub use model::{Difficulty, Directory, Resource, ResourceStatus};
pub use store::{CatalogError, CatalogStore, FileCatalogStore, InMemoryCatalogStore};
