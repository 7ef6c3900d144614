//! Core type definitions for the reqsplit pipeline

use serde::{Deserialize, Deserializer, Serialize};

/// Row number linking records across every pipeline file
pub type RowNumber = u32;

/// An original requirement as stored in `data.json`
///
/// Both keys must be present in the file; a `null` value loads as the
/// default (row `0`, empty text) so the batch driver can skip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(deserialize_with = "null_as_default")]
    pub row: RowNumber,
    #[serde(deserialize_with = "null_as_default")]
    pub req: String,
}

impl Requirement {
    pub fn new(row: RowNumber, req: impl Into<String>) -> Self {
        Self {
            row,
            req: req.into(),
        }
    }

    /// Row is missing (zero) or the requirement text is blank
    pub fn is_blank(&self) -> bool {
        self.row == 0 || self.req.trim().is_empty()
    }
}

/// One element of a decomposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRequirement {
    /// Opaque identifier; numbers returned by the model are kept as text
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Text following the 12-section requirement template
    pub description: String,
}

impl SubRequirement {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// All sub-requirements produced for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub row_number: RowNumber,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decomposed_list: Vec<SubRequirement>,
}

impl DecompositionResult {
    pub fn new(row_number: RowNumber, decomposed_list: Vec<SubRequirement>) -> Self {
        Self {
            row_number,
            decomposed_list,
        }
    }

    /// Row is missing or nothing was decomposed
    pub fn is_blank(&self) -> bool {
        self.row_number == 0 || self.decomposed_list.is_empty()
    }
}

/// Consistency judgement returned by the evaluation model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Score on a 1-5 scale
    pub score: u8,
    pub justification: String,
}

impl Evaluation {
    pub const MIN_SCORE: u8 = 1;
    pub const MAX_SCORE: u8 = 5;

    pub fn score_in_range(&self) -> bool {
        (Self::MIN_SCORE..=Self::MAX_SCORE).contains(&self.score)
    }
}

/// Evaluation of one row's decomposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub row_number: RowNumber,
    pub evaluation: Evaluation,
}

/// Concatenated description text of one row, used for similarity scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub row: RowNumber,
    #[serde(default)]
    pub concatenated: String,
    #[serde(default)]
    pub description_count: usize,
}

impl MetricRecord {
    /// Join descriptions with single spaces
    pub fn from_descriptions(row: RowNumber, descriptions: &[String]) -> Self {
        Self {
            row,
            concatenated: descriptions.join(" "),
            description_count: descriptions.len(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_null_fields_load_as_blank() {
        let req: Requirement = serde_json::from_str(r#"{"row": null, "req": "登录"}"#).unwrap();
        assert_eq!(req.row, 0);
        assert!(req.is_blank());

        let req: Requirement = serde_json::from_str(r#"{"row": 3, "req": null}"#).unwrap();
        assert_eq!(req.req, "");
        assert!(req.is_blank());
    }

    #[test]
    fn test_requirement_missing_key_rejected() {
        let result = serde_json::from_str::<Requirement>(r#"{"row": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_sub_requirement_numeric_id() {
        let sub: SubRequirement =
            serde_json::from_str(r#"{"id": 7, "description": "【需求描述】登录"}"#).unwrap();
        assert_eq!(sub.id, "7");
    }

    #[test]
    fn test_decomposition_result_lenient_fields() {
        let result: DecompositionResult = serde_json::from_str(r#"{"decomposed_list": []}"#).unwrap();
        assert_eq!(result.row_number, 0);
        assert!(result.is_blank());
    }

    #[test]
    fn test_evaluation_score_range() {
        let eval = Evaluation {
            score: 5,
            justification: "ok".to_string(),
        };
        assert!(eval.score_in_range());
        assert!(!Evaluation { score: 0, ..eval.clone() }.score_in_range());
        assert!(!Evaluation { score: 6, ..eval }.score_in_range());
    }

    #[test]
    fn test_metric_record_from_descriptions() {
        let record =
            MetricRecord::from_descriptions(4, &["用户名登录".to_string(), "手机号登录".to_string()]);
        assert_eq!(record.concatenated, "用户名登录 手机号登录");
        assert_eq!(record.description_count, 2);
    }
}
