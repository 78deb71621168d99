//! 学习路径：值对象、LLM JSON 的强类型解析与结构校验
//!
//! LLM 文本先剥离代码围栏，再反序列化为 RawLearningPath，最后对照候选集校验为 LearningPath。
//! 任何不满足不变量的输出都返回 InvalidLlmResponse，不做静默修正。

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::Resource;
use crate::core::ClewError;

pub const MIN_PATH_LEN: usize = 4;
pub const MAX_PATH_LEN: usize = 6;

const OPERATION: &str = "path_generation";

/// 路径来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathOrigin {
    /// LLM 推理选择
    Reasoned,
    /// 降级：按权威度与难度的启发式选择
    Heuristic,
}

/// 路径中的一步
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    /// 从 1 开始连续
    pub sequence: u32,
    pub resource: Resource,
    pub hours: u32,
    pub justification: String,
    pub sequence_note: String,
}

/// 个性化学习路径，长度恒在 [4, 6]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub profile_summary: String,
    pub steps: Vec<PathStep>,
    pub approach_guidance: String,
    pub total_hours: u32,
    pub origin: PathOrigin,
}

impl LearningPath {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn resource_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.resource.id.as_str()).collect()
    }
}

/// LLM 返回的原始 JSON 结构
#[derive(Debug, Deserialize)]
struct RawLearningPath {
    recommended_resources: Vec<RawStep>,
    #[serde(default)]
    approach_guidance: String,
    total_estimated_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    resource_id: String,
    #[serde(default)]
    why_for_you: String,
    sequence_order: Option<u32>,
    #[serde(default)]
    sequence_note: Option<String>,
    #[serde(default)]
    estimated_hours: Option<f64>,
}

/// 去掉 ``` 围栏及其语言标记（json / JSON / ...）；无围栏时原样返回（已 trim）
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let body = &trimmed[start + 3..];
    let tag_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(body.len());
    let body = &body[tag_len..];
    body.find("```")
        .map(|end| body[..end].trim())
        .unwrap_or(body.trim())
}

fn invalid(details: impl Into<String>) -> ClewError {
    ClewError::invalid_response(OPERATION, details)
}

/// 解析并校验 LLM 输出
pub fn parse_learning_path(
    response: &str,
    candidates: &[Resource],
    profile_summary: &str,
) -> Result<LearningPath, ClewError> {
    let json = strip_code_fences(response);
    let raw: RawLearningPath =
        serde_json::from_str(json).map_err(|e| invalid(format!("Invalid JSON: {e}")))?;

    let n = raw.recommended_resources.len();
    if !(MIN_PATH_LEN..=MAX_PATH_LEN).contains(&n) {
        return Err(invalid(format!(
            "Path has {n} resources (expected {MIN_PATH_LEN}-{MAX_PATH_LEN})"
        )));
    }

    let total = raw
        .total_estimated_hours
        .ok_or_else(|| invalid("Missing total_estimated_hours"))?;
    if !total.is_finite() || total < 0.0 {
        return Err(invalid(format!("Invalid total_estimated_hours: {total}")));
    }

    let by_id: HashMap<&str, &Resource> =
        candidates.iter().map(|r| (r.id.as_str(), r)).collect();
    let mut seen = HashSet::new();
    let mut steps = Vec::with_capacity(n);
    for raw_step in raw.recommended_resources {
        let resource = by_id
            .get(raw_step.resource_id.as_str())
            .ok_or_else(|| invalid(format!("Unknown resource id: {}", raw_step.resource_id)))?;
        if !seen.insert(raw_step.resource_id.clone()) {
            return Err(invalid(format!("Duplicate resource id: {}", raw_step.resource_id)));
        }
        let justification = raw_step.why_for_you.trim().to_string();
        if justification.is_empty() {
            return Err(invalid(format!("Empty justification for {}", raw_step.resource_id)));
        }
        let sequence = raw_step
            .sequence_order
            .ok_or_else(|| invalid(format!("Missing sequence_order for {}", raw_step.resource_id)))?;
        let hours = raw_step
            .estimated_hours
            .filter(|h| h.is_finite() && *h >= 0.0)
            .map(|h| h.round() as u32)
            .unwrap_or(resource.estimated_hours);
        steps.push(PathStep {
            sequence,
            resource: (*resource).clone(),
            hours,
            justification,
            sequence_note: raw_step.sequence_note.unwrap_or_default(),
        });
    }

    steps.sort_by_key(|s| s.sequence);
    for (idx, step) in steps.iter().enumerate() {
        if step.sequence as usize != idx + 1 {
            return Err(invalid("Sequence positions must be contiguous from 1"));
        }
    }
    check_prerequisite_order(&steps)?;

    Ok(LearningPath {
        profile_summary: profile_summary.to_string(),
        steps,
        approach_guidance: raw.approach_guidance.trim().to_string(),
        total_hours: total.round() as u32,
        origin: PathOrigin::Reasoned,
    })
}

/// 已选资源之间声明的前置关系必须先于后继出现
fn check_prerequisite_order(steps: &[PathStep]) -> Result<(), ClewError> {
    let position: HashMap<&str, u32> = steps
        .iter()
        .map(|s| (s.resource.id.as_str(), s.sequence))
        .collect();
    for step in steps {
        for pre in &step.resource.prerequisites {
            if let Some(&pre_pos) = position.get(pre.as_str()) {
                if pre_pos >= step.sequence {
                    return Err(invalid(format!(
                        "{} is sequenced before its prerequisite {}",
                        step.resource.id, pre
                    )));
                }
            }
        }
    }
    Ok(())
}

/// 稳定拓扑排序：在保持原相对顺序的前提下，把前置资源排到后继之前；出现环时剩余项按原顺序追加
pub fn order_by_prerequisites(selected: Vec<Resource>) -> Vec<Resource> {
    let ids: HashSet<String> = selected.iter().map(|r| r.id.clone()).collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut remaining = selected;
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let ready = remaining.iter().position(|r| {
            r.prerequisites
                .iter()
                .all(|p| !ids.contains(p) || placed.contains(p))
        });
        match ready {
            Some(idx) => {
                let r = remaining.remove(idx);
                placed.insert(r.id.clone());
                ordered.push(r);
            }
            None => {
                ordered.append(&mut remaining);
            }
        }
    }
    ordered
}
