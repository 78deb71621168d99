//! Clew 命令行入口
//!
//! 用法: clew <vibe-check|refine|briefing|curate> [request.json]
//!
//! 请求 JSON 从文件读取，省略时读 stdin；结果 JSON 写 stdout，日志写 stderr。
//! 配置文件路径可通过 CLEW_CONFIG 指定。

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clew::agents::{Profile, ProfileOrigin, VibeCheckResponses};
use clew::config::{load_config, AppConfig};
use clew::core::{build_orchestrator, ClewError, Orchestrator};
use clew::curator::Curator;
use clew::llm::{create_llm_from_config, LlmClient};
use clew::observability;
use serde::Deserialize;
use serde_json::{json, Value};

const USAGE: &str = "usage: clew <vibe-check|refine|briefing|curate> [request.json]";

#[derive(Deserialize)]
struct VibeCheckRequest {
    vibe_check_responses: VibeCheckResponses,
}

#[derive(Deserialize)]
struct RefineRequest {
    original_profile: String,
    user_correction: String,
    #[serde(default)]
    refinement_count: u32,
}

#[derive(Deserialize)]
struct BriefingRequest {
    profile: String,
}

fn read_request(path: Option<&str>) -> anyhow::Result<Value> {
    let raw = match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("Failed to read {p}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Request is not valid JSON")
}

/// 请求体结构不符时按校验错误返回，与缺字段同一类
fn parse_request<T: for<'de> Deserialize<'de>>(request: Value) -> Result<T, ClewError> {
    serde_json::from_value(request).map_err(|e| ClewError::validation("request", e.to_string()))
}

fn profile_json(profile: &Profile) -> Value {
    json!({
        "profile": profile.text,
        "origin": profile.origin,
        "note": profile.note,
    })
}

async fn dispatch(
    orchestrator: &Orchestrator,
    command: &str,
    request: Value,
) -> Result<Value, ClewError> {
    match command {
        "vibe-check" => {
            let req: VibeCheckRequest = parse_request(request)?;
            let profile = orchestrator
                .process_vibe_check(&req.vibe_check_responses)
                .await?;
            Ok(profile_json(&profile))
        }
        "refine" => {
            let req: RefineRequest = parse_request(request)?;
            orchestrator.ensure_refinement_allowed(req.refinement_count)?;
            let original = Profile::new(req.original_profile, ProfileOrigin::Reasoned);
            let refined = orchestrator
                .process_refinement(&original, &req.user_correction)
                .await?;
            Ok(profile_json(&refined))
        }
        "briefing" => {
            let req: BriefingRequest = parse_request(request)?;
            let approved = Profile::new(req.profile, ProfileOrigin::Reasoned);
            let path = orchestrator.generate_briefing(&approved).await?;
            serde_json::to_value(&path).map_err(|e| ClewError::unexpected("briefing", e.to_string()))
        }
        other => Err(ClewError::validation("command", format!("Unknown command: {other}"))),
    }
}

async fn curate(cfg: &AppConfig) -> anyhow::Result<()> {
    let curator = Curator::from_config(cfg).context("Failed to build link verifier")?;
    let report = curator.run().await.context("Curation failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        bail!(USAGE);
    };

    let config_path = std::env::var("CLEW_CONFIG").ok().map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    if command == "curate" {
        return curate(&cfg).await;
    }
    if !matches!(command, "vibe-check" | "refine" | "briefing") {
        bail!(USAGE);
    }

    let llm = create_llm_from_config(&cfg);
    let orchestrator =
        build_orchestrator(&cfg, llm.clone()).context("Failed to build orchestrator")?;
    let request = read_request(args.get(1).map(String::as_str))?;

    let outcome = dispatch(&orchestrator, command, request).await;
    let (prompt_tokens, completion_tokens, total_tokens) = llm.token_usage();
    tracing::info!(
        prompt_tokens,
        completion_tokens,
        total_tokens,
        "LLM token usage"
    );

    match outcome {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Request failed");
            println!("{}", serde_json::to_string_pretty(&e.to_response())?);
            std::process::exit(1);
        }
    }
}
