//! 链接校验工具：HEAD 探测 URL 是否可达
//!
//! 2xx / 3xx 视为可达；非成功状态与连接错误按线性退避重试，重试耗尽返回 false。
//! 网络层面的失败不会以错误形式上抛，只有客户端构造失败这类程序错误才返回 VerifyError。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::VerifierSection;

/// 校验过程中的非网络错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    #[error("verifier misconfigured: {0}")]
    Client(String),

    #[error("unexpected verification failure: {0}")]
    Unexpected(String),
}

/// 链接校验 trait：Ok(true) 可达，Ok(false) 不可达，Err 为无法得出结论
#[async_trait]
pub trait LinkVerifier: Send + Sync {
    async fn verify(&self, url: &str) -> Result<bool, VerifyError>;
}

/// 日志中只保留 URL 前 100 个字符
fn short(url: &str) -> &str {
    match url.char_indices().nth(100) {
        Some((idx, _)) => &url[..idx],
        None => url,
    }
}

/// 基于 reqwest 的 HEAD 校验
#[derive(Debug, Clone)]
pub struct HttpLinkVerifier {
    client: Client,
    retries: u32,
    backoff: Duration,
}

impl HttpLinkVerifier {
    pub fn new(
        timeout: Duration,
        retries: u32,
        backoff: Duration,
        user_agent: &str,
    ) -> Result<Self, VerifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| VerifyError::Client(e.to_string()))?;
        Ok(Self {
            client,
            retries,
            backoff,
        })
    }

    /// 按 [verifier] 段构造；`timeout` 为调用方（Scout / Curator）各自的单次探测时限
    pub fn from_config(cfg: &VerifierSection, timeout: Duration) -> Result<Self, VerifyError> {
        Self::new(
            timeout,
            cfg.retries,
            Duration::from_millis(cfg.backoff_ms),
            &cfg.user_agent,
        )
    }
}

#[async_trait]
impl LinkVerifier for HttpLinkVerifier {
    async fn verify(&self, url: &str) -> Result<bool, VerifyError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            tracing::warn!(url = %short(url), "[tool:verifier] Invalid URL");
            return Ok(false);
        }

        let attempts = self.retries + 1;
        for attempt in 0..attempts {
            match self.client.head(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() || status.is_redirection() {
                        return Ok(true);
                    }
                    tracing::info!(
                        url = %short(url),
                        "[tool:verifier] HTTP {} (attempt {}/{})",
                        status.as_u16(),
                        attempt + 1,
                        attempts
                    );
                }
                Err(e) if e.is_builder() => {
                    return Err(VerifyError::Unexpected(e.to_string()));
                }
                Err(e) => {
                    tracing::info!(
                        url = %short(url),
                        error = %e,
                        "[tool:verifier] Connection error (attempt {}/{})",
                        attempt + 1,
                        attempts
                    );
                }
            }
            if attempt + 1 < attempts {
                tokio::time::sleep(self.backoff * (attempt + 1)).await;
            }
        }
        Ok(false)
    }
}

/// 单个 URL 的预设校验结果
#[derive(Debug, Clone, PartialEq)]
pub enum StubOutcome {
    Live,
    Dead,
    Error(String),
}

/// 预设结果的校验器（测试 / 离线运行）；未登记的 URL 返回 default
#[derive(Debug, Clone)]
pub struct StaticLinkVerifier {
    outcomes: HashMap<String, StubOutcome>,
    default: StubOutcome,
}

impl StaticLinkVerifier {
    pub fn new(default: StubOutcome) -> Self {
        Self {
            outcomes: HashMap::new(),
            default,
        }
    }

    pub fn with(mut self, url: impl Into<String>, outcome: StubOutcome) -> Self {
        self.outcomes.insert(url.into(), outcome);
        self
    }
}

#[async_trait]
impl LinkVerifier for StaticLinkVerifier {
    async fn verify(&self, url: &str) -> Result<bool, VerifyError> {
        match self.outcomes.get(url).unwrap_or(&self.default) {
            StubOutcome::Live => Ok(true),
            StubOutcome::Dead => Ok(false),
            StubOutcome::Error(msg) => Err(VerifyError::Unexpected(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 本地起一个只回固定状态行的 HTTP 服务，返回其 URL
    async fn serve_status(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let resp = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
                let _ = socket.write_all(resp.as_bytes()).await;
            }
        });
        format!("http://{addr}/course")
    }

    fn verifier(retries: u32) -> HttpLinkVerifier {
        HttpLinkVerifier::new(
            Duration::from_secs(2),
            retries,
            Duration::from_millis(1),
            "clew-test",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_live_url() {
        let url = serve_status("HTTP/1.1 200 OK").await;
        assert_eq!(verifier(0).verify(&url).await, Ok(true));
    }

    #[tokio::test]
    async fn test_not_found_after_retries() {
        let url = serve_status("HTTP/1.1 404 Not Found").await;
        assert_eq!(verifier(2).verify(&url).await, Ok(false));
    }

    #[tokio::test]
    async fn test_connection_refused_is_false() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{addr}/");
        assert_eq!(verifier(1).verify(&url).await, Ok(false));
    }

    #[tokio::test]
    async fn test_invalid_scheme_is_false_without_request() {
        assert_eq!(verifier(0).verify("ftp://example.org").await, Ok(false));
        assert_eq!(verifier(0).verify("").await, Ok(false));
    }

    #[tokio::test]
    async fn test_static_verifier() {
        let v = StaticLinkVerifier::new(StubOutcome::Live)
            .with("https://dead.example", StubOutcome::Dead)
            .with("https://flaky.example", StubOutcome::Error("dns".into()));
        assert_eq!(v.verify("https://any.example").await, Ok(true));
        assert_eq!(v.verify("https://dead.example").await, Ok(false));
        assert!(v.verify("https://flaky.example").await.is_err());
    }
}
