//! Curator：定期重新校验整个目录并推进保鲜状态

pub mod batch;
pub mod freshness;

pub use batch::{CurationReport, Curator};
pub use freshness::{apply_verification, check_all, CurationStats};
