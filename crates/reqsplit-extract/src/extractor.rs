//! Pulling requirement text out of sheets and `【section】` formatted strings

use crate::sheet::Sheet;
use regex::Regex;
use reqsplit_core::{DecompositionResult, MetricRecord, Requirement, Result, RowNumber, SubRequirement};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, warn};

/// Section holding the functional description of a sub-requirement
pub const DESCRIPTION_FIELD: &str = "需求描述";

/// Content of the `【field】` section of `text`
///
/// Runs from just after the marker to the next `【` or the end of the string,
/// trimmed. `None` when the marker is absent.
pub fn extract_content(text: &str, field: &str) -> Option<String> {
    let pattern = format!("【{}】([^【]*)", regex::escape(field));
    let re = Regex::new(&pattern).ok()?;

    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Non-empty `【需求描述】` contents of a decomposed list, in order
pub fn extract_descriptions(sub_requirements: &[SubRequirement]) -> Vec<String> {
    sub_requirements
        .iter()
        .filter(|sub| !sub.description.is_empty())
        .filter_map(|sub| extract_content(&sub.description, DESCRIPTION_FIELD))
        .filter(|content| !content.is_empty())
        .collect()
}

/// One metric record per usable decomposition result
pub fn metric_records_from_decompositions(results: &[DecompositionResult]) -> Vec<MetricRecord> {
    results
        .iter()
        .filter(|result| !result.is_blank())
        .map(|result| {
            let descriptions = extract_descriptions(&result.decomposed_list);
            if descriptions.is_empty() {
                debug!("Row {} has no 【需求描述】 sections", result.row_number);
            }
            MetricRecord::from_descriptions(result.row_number, &descriptions)
        })
        .collect()
}

/// Read one cell from a workbook, logging instead of failing
///
/// Opens the workbook on every call; use [`Sheet`] directly for bulk reads.
pub fn read_requirement(
    path: impl AsRef<Path>,
    header: &str,
    row: RowNumber,
    sheet_name: Option<&str>,
) -> Option<String> {
    let path = path.as_ref();
    let lookup = Sheet::open(path, sheet_name).and_then(|sheet| sheet.lookup(header, row));

    match lookup {
        Ok(Some(text)) => Some(text),
        Ok(None) => {
            debug!("Row {} of column {:?} is empty", row, header);
            None
        }
        Err(e) => {
            warn!("Could not read {} row {}: {}", path.display(), row, e);
            None
        }
    }
}

/// Requirement records from every non-empty L1 cell in `rows`
///
/// Rows past the end of the sheet are ignored.
pub fn requirements_from_sheet(
    sheet: &Sheet,
    l1_header: &str,
    rows: Range<RowNumber>,
) -> Result<Vec<Requirement>> {
    let col = sheet.column(l1_header)?;
    let last = rows.end.min(sheet.max_row() + 1);

    let mut requirements = Vec::new();
    for row in rows.start.max(1)..last {
        if let Some(text) = sheet.cell(row, col)? {
            requirements.push(Requirement::new(row, text));
        }
    }

    info!(
        "Extracted {} requirements from sheet {:?}",
        requirements.len(),
        sheet.name()
    );
    Ok(requirements)
}

/// Group reference sub-requirements under the L1 row they belong to
///
/// A non-empty L1 cell opens a new block keyed by its row; every row,
/// including the L1 row itself, adds the `【需求描述】` of its L2 cell to the
/// open block. Rows before the first L1 cell form a block keyed by row 0,
/// emitted only when it collected something.
pub fn group_reference_blocks(
    sheet: &Sheet,
    l1_header: &str,
    l2_header: &str,
    rows: Range<RowNumber>,
) -> Result<Vec<MetricRecord>> {
    let l1 = sheet.column(l1_header)?;
    let l2 = sheet.column(l2_header)?;
    let last = rows.end.min(sheet.max_row() + 1);

    let mut blocks = Vec::new();
    let mut block_row: RowNumber = 0;
    let mut descriptions: Vec<String> = Vec::new();

    for row in rows.start.max(1)..last {
        if sheet.cell(row, l1)?.is_some() {
            if block_row != 0 || !descriptions.is_empty() {
                blocks.push(MetricRecord::from_descriptions(block_row, &descriptions));
            }
            block_row = row;
            descriptions.clear();
        }

        match sheet
            .cell(row, l2)?
            .and_then(|text| extract_content(&text, DESCRIPTION_FIELD))
        {
            Some(content) if !content.is_empty() => descriptions.push(content),
            _ => debug!("Row {} has no reference description", row),
        }
    }

    if block_row != 0 || !descriptions.is_empty() {
        blocks.push(MetricRecord::from_descriptions(block_row, &descriptions));
    }

    info!(
        "Grouped {} reference blocks from sheet {:?}",
        blocks.len(),
        sheet.name()
    );
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    const L1: &str = "L1华为格式";
    const L2: &str = "L2华为格式";

    #[test]
    fn test_extract_content_between_markers() {
        let text = "【需求价值】提升效率\n【需求描述】\n  用户名登录  \n【目标用户】终端用户";
        assert_eq!(
            extract_content(text, "需求描述"),
            Some("用户名登录".to_string())
        );
        assert_eq!(extract_content(text, "目标用户"), Some("终端用户".to_string()));
    }

    #[test]
    fn test_extract_content_missing_marker() {
        assert_eq!(extract_content("没有标记的文本", "需求描述"), None);
        assert_eq!(extract_content("【需求价值】x", "需求描述"), None);
    }

    #[test]
    fn test_extract_content_escapes_field() {
        let text = "【ROM&RAM】不超过10MB【验收标准】通过";
        assert_eq!(extract_content(text, "ROM&RAM"), Some("不超过10MB".to_string()));
        assert_eq!(extract_content("【a.b】x", "a+b"), None);
    }

    #[test]
    fn test_extract_content_empty_section() {
        assert_eq!(
            extract_content("【需求描述】  【目标用户】x", "需求描述"),
            Some(String::new())
        );
    }

    #[test]
    fn test_extract_descriptions_skips_empty() {
        let subs = vec![
            SubRequirement::new("1", "【需求描述】用户名登录【目标用户】用户"),
            SubRequirement::new("2", ""),
            SubRequirement::new("3", "【需求价值】无描述"),
            SubRequirement::new("4", "【需求描述】   "),
            SubRequirement::new("5", "【需求描述】手机号登录"),
        ];
        assert_eq!(
            extract_descriptions(&subs),
            vec!["用户名登录".to_string(), "手机号登录".to_string()]
        );
    }

    #[test]
    fn test_metric_records_from_decompositions() {
        let results = vec![
            DecompositionResult::new(
                2,
                vec![
                    SubRequirement::new("1", "【需求描述】用户名登录"),
                    SubRequirement::new("2", "【需求描述】手机号登录"),
                ],
            ),
            DecompositionResult::new(0, vec![SubRequirement::new("1", "【需求描述】x")]),
            DecompositionResult::new(3, vec![]),
        ];

        let records = metric_records_from_decompositions(&results);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row, 2);
        assert_eq!(records[0].concatenated, "用户名登录 手机号登录");
        assert_eq!(records[0].description_count, 2);

        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["description_count"], 2);
    }

    fn reference_sheet() -> Sheet {
        Sheet::from_rows(
            "Sheet1",
            &[
                vec![Some(L1), Some(L2)],
                vec![None, Some("【需求描述】孤立子需求")],
                vec![Some("用户登录"), Some("【需求描述】用户名登录")],
                vec![None, Some("【需求描述】手机号登录")],
                vec![None, Some("没有描述段")],
                vec![Some("查看余额"), None],
                vec![None, Some("【需求描述】余额查询")],
            ],
        )
    }

    #[test]
    fn test_requirements_from_sheet() {
        let requirements = requirements_from_sheet(&reference_sheet(), L1, 2..135).unwrap();
        assert_eq!(
            requirements,
            vec![Requirement::new(3, "用户登录"), Requirement::new(6, "查看余额")]
        );
    }

    #[test]
    fn test_group_reference_blocks() {
        let blocks = group_reference_blocks(&reference_sheet(), L1, L2, 2..135).unwrap();

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].row, 0);
        assert_eq!(blocks[0].concatenated, "孤立子需求");

        assert_eq!(blocks[1].row, 3);
        assert_eq!(blocks[1].concatenated, "用户名登录 手机号登录");
        assert_eq!(blocks[1].description_count, 2);

        assert_eq!(blocks[2].row, 6);
        assert_eq!(blocks[2].concatenated, "余额查询");
    }

    #[test]
    fn test_group_reference_blocks_no_leading_block() {
        let sheet = Sheet::from_rows(
            "Sheet1",
            &[
                vec![Some(L1), Some(L2)],
                vec![Some("用户登录"), Some("【需求描述】用户名登录")],
            ],
        );
        let blocks = group_reference_blocks(&sheet, L1, L2, 2..135).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].row, 2);
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let result = group_reference_blocks(&reference_sheet(), L1, "L3", 2..10);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_requirement_missing_workbook() {
        assert_eq!(read_requirement("/nonexistent/data.xlsx", L1, 2, None), None);
    }
}
