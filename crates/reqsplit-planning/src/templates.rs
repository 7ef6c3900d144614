//! Fixed prompt texts: the requirement template, JSON schemas and rubric

/// The 12-section template every sub-requirement description follows
pub const REQ_FORMAT_TEMPLATE: &str = "\
【需求价值】
该需求旨在解决何种核心问题，或为用户及业务带来何种收益。

【需求场景】
该需求的适用业务场景与具体触发条件。

【需求描述】
该需求需实现功能的详细说明，包括主要流程与关键交互。

【目标用户】
该需求的明确使用人群，例如某类终端用户或系统角色。

【限制约束】
实现该需求需满足的约束条件，如用户前置操作、技术或业务限制等。

【外部依赖】
该需求所依赖的外部系统、组件或服务。

【性能指标】
该需求的性能要求，例如响应时间、并发能力等指标，需明确对比基线或提升目标。

【ROM&RAM】
该需求对设备存储（ROM）与内存（RAM）的占用要求，需明确对比基线或优化目标。

【验收标准】
该需求通过验收的判定条件与依据，例如功能完整性、性能达成度等维度。

【验收设备】
验收该需求所需的设备类型与测试环境，如特定型号手机、操作系统版本等。

【使用产品差异分析】
该需求在不同设备或平台上的使用行为差异；如无差异，需明确说明。

【2D生态】
该需求对面向开发者的软件生态建设可能产生的影响。
";

/// Section names of [`REQ_FORMAT_TEMPLATE`], in order
pub const TEMPLATE_SECTIONS: [&str; 12] = [
    "需求价值",
    "需求场景",
    "需求描述",
    "目标用户",
    "限制约束",
    "外部依赖",
    "性能指标",
    "ROM&RAM",
    "验收标准",
    "验收设备",
    "使用产品差异分析",
    "2D生态",
];

/// Schema of a decomposition response: an array of `{id, description}`
pub const DECOMPOSITION_SCHEMA: &str = r#"{
  "type": "array",
  "description": "分解后的子需求列表。",
  "items": {
    "type": "object",
    "properties": {
      "id": {
        "type": "string",
        "description": "子需求的唯一标识符 (UUID)。"
      },
      "description": {
        "type": "string",
        "description": "子需求的详细描述，必须严格遵循'需求格式定义'。"
      }
    },
    "required": ["id", "description"]
  }
}"#;

/// Schema of an evaluation response: `{score, justification}`
pub const EVALUATION_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "score": {
      "type": "integer",
      "description": "一致性评分，范围从1到5。",
      "minimum": 1,
      "maximum": 5
    },
    "justification": {
      "type": "string",
      "description": "针对评分的简要说明。"
    }
  },
  "required": ["score", "justification"]
}"#;

/// Consistency criteria and 1-5 rubric placed ahead of the evaluated texts
pub const EVALUATION_RUBRIC: &str = "\
根据以下标准，严格评估原始需求和已分解的子需求之间的一致性。

**评估维度：一致性**
- 已分解的子需求必须完全涵盖原始需求的所有内容。
- 已分解的子需求不得超出原始需求的功能范围。
- 已分解的子需求不得改变原始需求的实现技术，也不得使用原始需求中没有的技术。
- 已分解的子需求不得对原始需求进行细化，必须完全忠实于原始需求的内容。

**评分标准：**
- 1 (强烈不同意): 拆解结果与预期标准严重不符，缺失原始需求的大部分内容或包含大量超出范围的功能。
- 2 (不同意): 拆解结果与预期标准不符，存在重大缺陷或不符合项。
- 3 (中立): 拆解结果符合预期标准，但对原始需求进行了细化，出现了原始需求没有的内容。
- 4 (同意): 拆解结果普遍符合或略高于预期标准，只有少量需要改进的地方。
- 5 (强烈同意): 拆解结果优秀，完全符合或超出预期标准。";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_lists_every_section_in_order() {
        let mut last = 0;
        for section in TEMPLATE_SECTIONS {
            let marker = format!("【{}】", section);
            let pos = REQ_FORMAT_TEMPLATE
                .find(&marker)
                .unwrap_or_else(|| panic!("missing section {}", section));
            assert!(pos >= last, "section {} out of order", section);
            last = pos;
        }
    }

    #[test]
    fn test_schemas_are_valid_json() {
        let decomposition: serde_json::Value = serde_json::from_str(DECOMPOSITION_SCHEMA).unwrap();
        assert_eq!(decomposition["type"], "array");

        let evaluation: serde_json::Value = serde_json::from_str(EVALUATION_SCHEMA).unwrap();
        assert_eq!(evaluation["properties"]["score"]["maximum"], 5);
    }
}
