//! 核心层：错误分类、恢复决策、编排

pub mod error;
pub mod orchestrator;
pub mod recovery;

pub use error::{ClewError, ErrorResponse, Severity};
pub use orchestrator::{build_orchestrator, Orchestrator};
pub use recovery::{RecoveryAction, RecoveryEngine};
