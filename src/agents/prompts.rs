//! Navigator 使用的 system prompt 与三类任务模板

use serde::Serialize;

use crate::agents::VibeCheckResponses;
use crate::catalog::{Difficulty, Resource};

pub const NAVIGATOR_SYSTEM_PROMPT: &str = "You are an empathetic AI learning advisor. Your role is to \
understand learners' backgrounds and goals, then guide them to the right free resources. You \
communicate in a warm, supportive tone using second person (\"you\"). You're knowledgeable but \
never condescending.";

pub fn profile_prompt(responses: &VibeCheckResponses) -> String {
    format!(
        "Based on these responses from a learner, create a 3-4 sentence profile summary.\n\n\
Vibe Check Responses:\n\
- Current take on AI: {}\n\
- Primary goal: {}\n\
- Learning style: {}\n\
- Professional background: {}\n\n\
Requirements:\n\
- Write in second person (\"You're approaching AI...\")\n\
- Be empathetic and supportive, not clinical\n\
- Reflect their skepticism level accurately\n\
- Note their goal, learning preference, and professional background\n\
- Keep it to 3-4 sentences\n\n\
Generate the profile summary:",
        responses.skepticism.trim(),
        responses.goal.trim(),
        responses.learning_style.trim(),
        responses.background.trim(),
    )
}

pub fn refinement_prompt(original: &str, correction: &str) -> String {
    format!(
        "A learner was shown this profile summary, but said it wasn't quite right:\n\n\
Original Profile:\n{original}\n\n\
Their Feedback:\n{correction}\n\n\
Please revise the profile to incorporate their feedback. Keep it to 3-4 sentences, use second \
person, and maintain an empathetic tone. Don't start from scratch - update the existing profile \
based on what they said.\n\n\
Revised profile:"
    )
}

/// 写入 prompt 的候选资源视图
#[derive(Serialize)]
struct CandidateView<'a> {
    id: &'a str,
    name: &'a str,
    provider: &'a str,
    provider_url: &'a str,
    resource_url: &'a str,
    authority_tier: u8,
    difficulty: &'a Difficulty,
    format: &'a str,
    estimated_hours: u32,
    free_model: &'a str,
    prerequisites: &'a [String],
    tags: &'a [String],
    description: &'a str,
    best_for: &'a str,
}

impl<'a> From<&'a Resource> for CandidateView<'a> {
    fn from(r: &'a Resource) -> Self {
        Self {
            id: &r.id,
            name: &r.name,
            provider: &r.provider,
            provider_url: &r.provider_url,
            resource_url: &r.resource_url,
            authority_tier: r.authority_tier,
            difficulty: &r.difficulty,
            format: &r.format,
            estimated_hours: r.estimated_hours,
            free_model: &r.free_model,
            prerequisites: &r.prerequisites,
            tags: &r.tags,
            description: &r.description,
            best_for: &r.best_for,
        }
    }
}

pub fn catalog_json(resources: &[Resource]) -> String {
    let views: Vec<CandidateView<'_>> = resources.iter().map(CandidateView::from).collect();
    serde_json::to_string_pretty(&views).unwrap_or_else(|_| "[]".to_string())
}

pub fn learning_path_prompt(profile: &str, resources: &[Resource]) -> String {
    format!(
        "You are creating a personalized learning path for this learner:\n\n\
LEARNER PROFILE:\n{profile}\n\n\
AVAILABLE RESOURCES (JSON):\n{catalog}\n\n\
TASK:\n\
Select 4-6 resources from the catalog above and sequence them into a learning path.\n\n\
REQUIREMENTS:\n\
1. Select 4-6 resources (not more, not less), using only ids from the catalog\n\
2. Sequence from easier to harder; a resource must come after every selected prerequisite\n\
3. Total estimated hours should be 30-60 hours\n\
4. For each resource, explain WHY it's right for THIS learner (2-3 sentences)\n\
5. Provide approach guidance (2-3 sentences on how to tackle this path)\n\
6. Weight higher authority_tier resources (tier 1 > tier 2 > tier 3)\n\
7. Match the learning style from the profile\n\n\
OUTPUT FORMAT: a single JSON object, no prose before or after:\n\
{{\n\
  \"recommended_resources\": [\n\
    {{\n\
      \"resource_id\": \"exact-id-from-catalog\",\n\
      \"why_for_you\": \"2-3 sentences\",\n\
      \"estimated_hours\": 10,\n\
      \"sequence_note\": \"Start here\" or \"Take after <previous resource name>\",\n\
      \"sequence_order\": 1\n\
    }}\n\
  ],\n\
  \"approach_guidance\": \"2-3 sentences\",\n\
  \"total_estimated_hours\": 40\n\
}}",
        catalog = catalog_json(resources),
    )
}
