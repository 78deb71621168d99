//! 工具：链接可达性校验

pub mod verifier;

pub use verifier::{
    HttpLinkVerifier, LinkVerifier, StaticLinkVerifier, StubOutcome, VerifyError,
};
