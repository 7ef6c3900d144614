//! Prompt builders for decomposition and evaluation calls
//!
//! System prompts never change during a run, so they are rendered once into a
//! [`PromptSet`] and shared by every call. User prompts are built per row.

use crate::templates::{DECOMPOSITION_SCHEMA, EVALUATION_RUBRIC, EVALUATION_SCHEMA, REQ_FORMAT_TEMPLATE};
use reqsplit_core::SubRequirement;

/// System prompts rendered once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    pub decomposition_system: String,
    pub evaluation_system: String,
}

impl PromptSet {
    /// Prompts using the standard 12-section template
    pub fn standard() -> Self {
        Self::with_format_template(REQ_FORMAT_TEMPLATE)
    }

    /// Prompts embedding a custom requirement template
    pub fn with_format_template(format_template: &str) -> Self {
        Self {
            decomposition_system: build_decomposition_system_prompt(format_template),
            evaluation_system: build_evaluation_system_prompt(),
        }
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::standard()
    }
}

fn build_decomposition_system_prompt(format_template: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "你是一个顶级的软件需求工程师。你的任务是根据用户提供的复杂需求、分解规则和格式定义，\
         将需求分解为一系列粒度更小的子需求。在这一过程中，你只负责分解而不负责细化，不允许添加细节。\n",
    );
    prompt.push_str("你必须以扁平化的列表结构返回结果。\n\n");

    prompt.push_str("你必须严格遵循以下的格式定义来构造你的输出：\n");
    prompt.push_str("--- 需求格式定义 ---\n");
    prompt.push_str(format_template.trim_end());
    prompt.push_str("\n--- 需求格式定义结束 ---\n\n");

    prompt.push_str(
        "你必须严格按照以下 JSON Schema 结构来构建你的输出。\
         你的响应必须是一个单一的 JSON 数组，且完全符合此结构定义：\n\n",
    );
    prompt.push_str("```json\n");
    prompt.push_str(DECOMPOSITION_SCHEMA);
    prompt.push_str("\n```\n");

    prompt
}

fn build_evaluation_system_prompt() -> String {
    let mut prompt = String::new();

    prompt.push_str("你是一个软件工程和需求分析的顶级专家，对于需求的一致性非常严格。\n");
    prompt.push_str("你的任务是评估一个已分解的需求与原始需求之间的一致性。\n");
    prompt.push_str(
        "你必须严格按照以下 JSON Schema 结构来构建你的输出。\
         你的响应必须是一个完全符合此结构定义的单一JSON对象。\n\n",
    );
    prompt.push_str("```json\n");
    prompt.push_str(EVALUATION_SCHEMA);
    prompt.push_str("\n```\n");

    prompt
}

/// Build the user prompt for one decomposition call
///
/// Rules are numbered from 1. Sections are separated by a blank line and
/// the extra instruction section only appears when one is given.
pub fn build_decomposition_user_prompt(
    original_requirement: &str,
    rules: &[String],
    format_instruction: Option<&str>,
) -> String {
    let mut parts = vec!["根据已定义的规则，分解以下原始需求。".to_string()];

    if !rules.is_empty() {
        parts.push("\n=== 分解规则 ===".to_string());
        for (i, rule) in rules.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, rule));
        }
    }

    parts.push("\n=== 原始需求 ===".to_string());
    parts.push(original_requirement.to_string());

    if let Some(instruction) = format_instruction.filter(|s| !s.trim().is_empty()) {
        parts.push("\n=== 额外输出要求 ===".to_string());
        parts.push(instruction.to_string());
    }

    parts.join("\n")
}

/// Render sub-requirement descriptions as a bulleted list
pub fn bullet_list(sub_requirements: &[SubRequirement]) -> String {
    sub_requirements
        .iter()
        .map(|s| format!("- {}", s.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt for one evaluation call
pub fn build_evaluation_user_prompt(
    original_requirement: &str,
    sub_requirements: &[SubRequirement],
) -> String {
    let mut prompt = String::new();

    prompt.push_str(EVALUATION_RUBRIC);
    prompt.push_str("\n\n");

    prompt.push_str("**原始需求：**\n");
    prompt.push_str(original_requirement);
    prompt.push_str("\n\n");

    prompt.push_str("**已分解的子需求：**\n");
    prompt.push_str(&bullet_list(sub_requirements));
    prompt.push_str("\n\n");

    prompt.push_str("请以指定的JSON格式提供你的评估。\n");

    prompt
}
