//! Configuration management for reqsplit
//!
//! Pipeline settings (decomposition rules, file locations, spreadsheet column
//! headers) are read from `reqsplit.toml` in the working directory. Every field
//! has a default, so a missing file or a partial file is fine.
//!
//! LLM credentials are not stored here; they come from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{ReqError, Result};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "reqsplit.toml";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Decomposition prompt inputs
    #[serde(default)]
    pub decomposition: DecompositionConfig,

    /// Evaluation stage settings
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Input and output file locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Spreadsheet layout
    #[serde(default)]
    pub sheet: SheetConfig,
}

/// Settings for the decomposition stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionConfig {
    /// Ordered rules embedded in the user prompt
    #[serde(default = "default_rules")]
    pub rules: Vec<String>,

    /// Extra output instruction appended to the user prompt
    #[serde(default)]
    pub format_instruction: Option<String>,

    /// Maximum requests in flight (1 = strictly sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// Settings for the evaluation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Maximum requests in flight (1 = strictly sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// File locations for every stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_workbook")]
    pub workbook: PathBuf,
    #[serde(default = "default_requirements")]
    pub requirements: PathBuf,
    #[serde(default = "default_decomposed")]
    pub decomposed: PathBuf,
    #[serde(default = "default_evaluations")]
    pub evaluations: PathBuf,
    #[serde(default = "default_predictions")]
    pub predictions: PathBuf,
    #[serde(default = "default_references")]
    pub references: PathBuf,
    #[serde(default = "default_scores")]
    pub scores: PathBuf,
}

/// Spreadsheet column headers and scan range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Header of the parent requirement column
    #[serde(default = "default_l1_column")]
    pub l1_column: String,

    /// Header of the reference sub-requirement column
    #[serde(default = "default_l2_column")]
    pub l2_column: String,

    /// Worksheet name (first sheet when absent)
    #[serde(default)]
    pub sheet_name: Option<String>,

    /// Exclusive upper bound of the scanned rows (scan starts at row 2)
    #[serde(default = "default_row_end")]
    pub row_end: u32,
}

// Default value providers
fn default_rules() -> Vec<String> {
    [
        "子需求应当是能分配给单一功能模块的，不可再分的最小原子功能需求，单个需求的内容不得跨越不同功能模块实现。",
        "子需求只是对原始需求的分解而不是细化，不可新增原始需求中没有的内容。",
        "子需求必须完全涵盖原始需求的所有内容。",
        "子需求的功能集合不得超出原始需求的功能范围。",
        "子需求应严格保持原始需求中的技术细节，包括算法、协议、版本等",
        "原始需求中为“无”等无内容表述的字段，子需求中也保持为“无”等表述",
        "子需求的性能指标需和原始需求的对应部分保持一致，不得新增或细化",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_concurrency() -> usize {
    1
}

fn default_workbook() -> PathBuf {
    PathBuf::from("ar_23/data.xlsx")
}

fn default_requirements() -> PathBuf {
    PathBuf::from("ar_23/data.json")
}

fn default_decomposed() -> PathBuf {
    PathBuf::from("ar_23/decomposed_output.json")
}

fn default_evaluations() -> PathBuf {
    PathBuf::from("ar_23/evaluation_output.json")
}

fn default_predictions() -> PathBuf {
    PathBuf::from("ar_23/ar_descriptions_1.json")
}

fn default_references() -> PathBuf {
    PathBuf::from("ar_23/ar_descriptions_ref.json")
}

fn default_scores() -> PathBuf {
    PathBuf::from("ar_23/all_scores_1.json")
}

fn default_l1_column() -> String {
    "L1华为格式".to_string()
}

fn default_l2_column() -> String {
    "L2华为格式".to_string()
}

fn default_row_end() -> u32 {
    135
}

impl PipelineConfig {
    /// Load configuration from `reqsplit.toml` in `dir` or use defaults
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)
                .map_err(|e| ReqError::Config(format!("Failed to parse config file: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `reqsplit.toml` in `dir`
    pub fn write_default(dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| ReqError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }

    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<()> {
        if self.decomposition.concurrency == 0 {
            return Err(ReqError::Config(
                "decomposition.concurrency must be at least 1".to_string(),
            ));
        }
        if self.evaluation.concurrency == 0 {
            return Err(ReqError::Config(
                "evaluation.concurrency must be at least 1".to_string(),
            ));
        }
        if self.sheet.l1_column.trim().is_empty() || self.sheet.l2_column.trim().is_empty() {
            return Err(ReqError::Config("sheet column headers must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            decomposition: DecompositionConfig::default(),
            evaluation: EvaluationConfig::default(),
            paths: PathsConfig::default(),
            sheet: SheetConfig::default(),
        }
    }
}

impl Default for DecompositionConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            format_instruction: None,
            concurrency: default_concurrency(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            workbook: default_workbook(),
            requirements: default_requirements(),
            decomposed: default_decomposed(),
            evaluations: default_evaluations(),
            predictions: default_predictions(),
            references: default_references(),
            scores: default_scores(),
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            l1_column: default_l1_column(),
            l2_column: default_l2_column(),
            sheet_name: None,
            row_end: default_row_end(),
        }
    }
}
