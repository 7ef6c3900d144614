//! Consistency scoring of a decomposition via one chat-completion call

use crate::prompt::{build_evaluation_user_prompt, PromptSet};
use reqsplit_agent::{ChatClient, FailureKind, LlmFailure, LlmResult};
use reqsplit_core::{Evaluation, SubRequirement};
use serde_json::Value;
use std::sync::Arc;

/// Asks an LLM to score a decomposition against its original requirement
pub struct Evaluator {
    client: Arc<dyn ChatClient>,
    prompts: Arc<PromptSet>,
}

impl Evaluator {
    pub fn new(client: Arc<dyn ChatClient>, prompts: Arc<PromptSet>) -> Self {
        Self { client, prompts }
    }

    /// Evaluate one decomposition; no retry on failure
    pub async fn evaluate(
        &self,
        original_requirement: &str,
        sub_requirements: &[SubRequirement],
    ) -> LlmResult<Evaluation> {
        let user_prompt = build_evaluation_user_prompt(original_requirement, sub_requirements);

        let raw = self
            .client
            .complete_json(&self.prompts.evaluation_system, &user_prompt)
            .await?;

        parse_evaluation(&raw)
    }
}

/// Parse a raw model response into an [`Evaluation`]
///
/// The score may arrive as an integer, an integral float or a numeric string;
/// it must land in 1..=5.
pub fn parse_evaluation(raw: &str) -> LlmResult<Evaluation> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        tracing::debug!("Unparseable evaluation response: {}", raw);
        LlmFailure::new(
            FailureKind::MalformedJson,
            format!("Failed to parse evaluation as JSON: {}", e),
        )
    })?;

    let object = value.as_object().ok_or_else(|| {
        LlmFailure::new(FailureKind::UnexpectedShape, "Evaluation is not a JSON object")
    })?;

    let score = object
        .get("score")
        .and_then(score_from_value)
        .ok_or_else(|| {
            LlmFailure::new(
                FailureKind::UnexpectedShape,
                format!("Missing or non-integer score: {:?}", object.get("score")),
            )
        })?;

    let justification = object
        .get("justification")
        .and_then(Value::as_str)
        .ok_or_else(|| LlmFailure::new(FailureKind::UnexpectedShape, "Missing justification"))?
        .to_string();

    let evaluation = Evaluation {
        score,
        justification,
    };

    if !evaluation.score_in_range() {
        return Err(LlmFailure::new(
            FailureKind::UnexpectedShape,
            format!(
                "Score {} outside {}-{}",
                evaluation.score,
                Evaluation::MIN_SCORE,
                Evaluation::MAX_SCORE
            ),
        ));
    }

    Ok(evaluation)
}

fn score_from_value(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => match n.as_u64() {
            Some(n) => n,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < 0.0 {
                    return None;
                }
                f as u64
            }
        },
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u8::try_from(n).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqsplit_agent::MockChatClient;

    #[tokio::test]
    async fn test_evaluate_success() {
        let client = Arc::new(
            MockChatClient::new().with_response(r#"{"score": 4, "justification": "基本一致"}"#),
        );
        let evaluator = Evaluator::new(client.clone(), Arc::new(PromptSet::standard()));

        let subs = vec![SubRequirement::new("1", "【需求描述】用户名登录")];
        let evaluation = evaluator.evaluate("用户可以登录", &subs).await.unwrap();

        assert_eq!(evaluation.score, 4);
        assert_eq!(evaluation.justification, "基本一致");

        let prompts = client.prompts();
        assert!(prompts[0].0.contains("\"minimum\": 1"));
        assert!(prompts[0].1.contains("- 【需求描述】用户名登录"));
    }

    #[test]
    fn test_parse_score_forms() {
        assert_eq!(parse_evaluation(r#"{"score": 5, "justification": ""}"#).unwrap().score, 5);
        assert_eq!(parse_evaluation(r#"{"score": 3.0, "justification": ""}"#).unwrap().score, 3);
        assert_eq!(parse_evaluation(r#"{"score": "2", "justification": ""}"#).unwrap().score, 2);
    }

    #[test]
    fn test_parse_out_of_range() {
        for raw in [
            r#"{"score": 0, "justification": "x"}"#,
            r#"{"score": 6, "justification": "x"}"#,
            r#"{"score": 300, "justification": "x"}"#,
            r#"{"score": 3.5, "justification": "x"}"#,
        ] {
            let failure = parse_evaluation(raw).unwrap_err();
            assert_eq!(failure.kind, FailureKind::UnexpectedShape, "{}", raw);
        }
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(
            parse_evaluation("{score: 4").unwrap_err().kind,
            FailureKind::MalformedJson
        );
        assert_eq!(
            parse_evaluation("[4]").unwrap_err().kind,
            FailureKind::UnexpectedShape
        );
        assert_eq!(
            parse_evaluation(r#"{"score": 4}"#).unwrap_err().kind,
            FailureKind::UnexpectedShape
        );
    }
}
