//! Agent 层：Scout（候选资源）与 Navigator（画像与路径推理），以及它们产出的值对象

pub mod navigator;
pub mod path;
pub mod profile;
pub mod prompts;
pub mod scout;
pub mod text;

pub use navigator::Navigator;
pub use path::{
    parse_learning_path, strip_code_fences, LearningPath, PathOrigin, PathStep, MAX_PATH_LEN,
    MIN_PATH_LEN,
};
pub use profile::{Profile, ProfileOrigin, VibeCheckResponses, MIN_PROFILE_CHARS};
pub use scout::Scout;
pub use text::fix_capitalization;
