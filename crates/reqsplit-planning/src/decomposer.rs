//! Requirement decomposition via one chat-completion call

use crate::prompt::{build_decomposition_user_prompt, PromptSet};
use reqsplit_agent::{ChatClient, FailureKind, LlmFailure, LlmResult};
use reqsplit_core::SubRequirement;
use serde_json::Value;
use std::sync::Arc;

/// Splits requirements into sub-requirements with an LLM
pub struct Decomposer {
    client: Arc<dyn ChatClient>,
    prompts: Arc<PromptSet>,
    rules: Vec<String>,
    format_instruction: Option<String>,
}

impl Decomposer {
    pub fn new(client: Arc<dyn ChatClient>, prompts: Arc<PromptSet>) -> Self {
        Self {
            client,
            prompts,
            rules: Vec::new(),
            format_instruction: None,
        }
    }

    /// Set the ordered decomposition rules
    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.rules = rules;
        self
    }

    /// Set the extra output instruction
    pub fn with_format_instruction(mut self, instruction: Option<String>) -> Self {
        self.format_instruction = instruction;
        self
    }

    /// Decompose one requirement; no retry on failure
    pub async fn decompose(&self, original_requirement: &str) -> LlmResult<Vec<SubRequirement>> {
        let user_prompt = build_decomposition_user_prompt(
            original_requirement,
            &self.rules,
            self.format_instruction.as_deref(),
        );

        let raw = self
            .client
            .complete_json(&self.prompts.decomposition_system, &user_prompt)
            .await?;

        parse_decomposition(&raw)
    }
}

/// Parse a raw model response into sub-requirements
///
/// Accepts a bare array, or an object whose only array-valued field holds the
/// list (JSON-object mode makes some providers wrap the array). Blank ids
/// are replaced with fresh UUIDs. An empty list counts as a failure.
pub fn parse_decomposition(raw: &str) -> LlmResult<Vec<SubRequirement>> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        tracing::debug!("Unparseable decomposition response: {}", raw);
        LlmFailure::new(
            FailureKind::MalformedJson,
            format!("Failed to parse response as JSON: {}", e),
        )
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut arrays = map.into_iter().filter(|(_, v)| v.is_array());
            match (arrays.next(), arrays.next()) {
                (Some((key, Value::Array(items))), None) => {
                    tracing::debug!("Unwrapped decomposition array from field {:?}", key);
                    items
                }
                _ => {
                    return Err(LlmFailure::new(
                        FailureKind::UnexpectedShape,
                        "Response is an object without a single array field",
                    ))
                }
            }
        }
        other => {
            return Err(LlmFailure::new(
                FailureKind::UnexpectedShape,
                format!("Response is not a JSON array: {}", other),
            ))
        }
    };

    if items.is_empty() {
        return Err(LlmFailure::new(
            FailureKind::UnexpectedShape,
            "Response array is empty",
        ));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let mut sub: SubRequirement = serde_json::from_value(item).map_err(|e| {
                LlmFailure::new(
                    FailureKind::UnexpectedShape,
                    format!("Element {} is not an {{id, description}} object: {}", i, e),
                )
            })?;
            if sub.id.trim().is_empty() {
                sub.id = uuid::Uuid::new_v4().to_string();
            }
            Ok(sub)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqsplit_agent::MockChatClient;

    const LOGIN_RESPONSE: &str = r#"[{"id":"1","description":"【需求描述】用户名登录"},{"id":"2","description":"【需求描述】手机号登录"}]"#;

    fn decomposer(client: Arc<MockChatClient>) -> Decomposer {
        Decomposer::new(client, Arc::new(PromptSet::standard())).with_rules(vec![
            "子需求应当是能分配给单一功能模块的，不可再分的最小原子功能需求。".to_string(),
        ])
    }

    #[tokio::test]
    async fn test_decompose_login_requirement() {
        let client = Arc::new(MockChatClient::new().with_response(LOGIN_RESPONSE));
        let decomposer = decomposer(client.clone());

        let subs = decomposer
            .decompose("用户可以通过用户名或手机号登录系统")
            .await
            .unwrap();

        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].id, "1");
        assert_eq!(subs[0].description, "【需求描述】用户名登录");
        assert_eq!(subs[1].id, "2");
        assert_eq!(subs[1].description, "【需求描述】手机号登录");

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("需求格式定义"));
        assert!(prompts[0].1.contains("1. 子需求应当是"));
        assert!(prompts[0].1.contains("用户可以通过用户名或手机号登录系统"));
    }

    #[tokio::test]
    async fn test_decompose_propagates_client_failure() {
        let client = Arc::new(
            MockChatClient::new().with_failure(LlmFailure::from_status(401, "bad key")),
        );
        let result = decomposer(client).decompose("登录").await;
        assert_eq!(result.unwrap_err().kind, FailureKind::Authentication);
    }

    #[test]
    fn test_parse_malformed_json() {
        let failure = parse_decomposition("not json").unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedJson);
    }

    #[test]
    fn test_parse_non_array() {
        let failure = parse_decomposition(r#""text""#).unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnexpectedShape);

        let failure = parse_decomposition(r#"{"id": "1", "description": "x"}"#).unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnexpectedShape);
    }

    #[test]
    fn test_parse_wrapped_array() {
        let subs = parse_decomposition(
            r#"{"sub_requirements": [{"id": "a", "description": "【需求描述】查看余额"}]}"#,
        )
        .unwrap();
        assert_eq!(subs, vec![SubRequirement::new("a", "【需求描述】查看余额")]);
    }

    #[test]
    fn test_parse_ambiguous_wrapper() {
        let failure = parse_decomposition(r#"{"a": [], "b": []}"#).unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnexpectedShape);
    }

    #[test]
    fn test_parse_empty_array() {
        let failure = parse_decomposition("[]").unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnexpectedShape);
    }

    #[test]
    fn test_parse_bad_element() {
        let failure = parse_decomposition(r#"[{"id": "1"}]"#).unwrap_err();
        assert_eq!(failure.kind, FailureKind::UnexpectedShape);
    }

    #[test]
    fn test_parse_blank_id_gets_uuid() {
        let subs = parse_decomposition(r#"[{"id": "", "description": "x"}]"#).unwrap();
        assert!(uuid::Uuid::parse_str(&subs[0].id).is_ok());
    }
}
