//! In-memory view of one worksheet, addressed the way spreadsheets are
//!
//! Rows and columns are 1-based and absolute: a sheet whose data starts at
//! `C4` still reports that cell as row 4, column 3. Row 1 is the header row.

use calamine::{open_workbook_auto, Data, Reader};
use reqsplit_core::{ReqError, Result, RowNumber};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A loaded worksheet; only string cells are kept
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    cells: HashMap<(u32, u32), String>,
    max_row: u32,
}

impl Sheet {
    /// Load a worksheet from an `.xlsx`, `.xls` or `.ods` workbook
    ///
    /// Without a name the first sheet is used.
    pub fn open(path: impl AsRef<Path>, sheet_name: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReqError::NotFound(path.to_path_buf()));
        }

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| ReqError::Workbook(format!("{}: {}", path.display(), e)))?;

        let names = workbook.sheet_names();
        let name = match sheet_name {
            Some(name) if names.iter().any(|n| n == name) => name.to_string(),
            Some(name) => return Err(ReqError::SheetNotFound(name.to_string())),
            None => names
                .first()
                .cloned()
                .ok_or_else(|| ReqError::Workbook(format!("{}: no sheets", path.display())))?,
        };

        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ReqError::Workbook(format!("{} [{}]: {}", path.display(), name, e)))?;

        let mut sheet = Sheet {
            name,
            ..Default::default()
        };

        if let (Some((start_row, start_col)), Some((end_row, _))) = (range.start(), range.end()) {
            sheet.max_row = end_row + 1;
            for (r, c, value) in range.used_cells() {
                if let Data::String(text) = value {
                    let row = start_row + r as u32 + 1;
                    let col = start_col + c as u32 + 1;
                    sheet.cells.insert((row, col), text.clone());
                }
            }
        }

        debug!(
            "Loaded sheet {:?} from {} ({} rows, {} text cells)",
            sheet.name,
            path.display(),
            sheet.max_row,
            sheet.cells.len()
        );

        Ok(sheet)
    }

    /// Build a sheet from literal rows, starting at row 1 column 1
    pub fn from_rows(name: impl Into<String>, rows: &[Vec<Option<&str>>]) -> Self {
        let mut cells = HashMap::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if let Some(text) = value {
                    cells.insert((r as u32 + 1, c as u32 + 1), text.to_string());
                }
            }
        }

        Sheet {
            name: name.into(),
            cells,
            max_row: rows.len() as u32,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last row holding any data
    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    /// Column index of an exact header match in row 1
    pub fn column(&self, header: &str) -> Result<u32> {
        self.cells
            .iter()
            .filter(|((row, _), text)| *row == 1 && text.as_str() == header)
            .map(|((_, col), _)| *col)
            .min()
            .ok_or_else(|| ReqError::HeaderNotFound(header.to_string()))
    }

    /// Trimmed text under `header` at `row`
    ///
    /// Empty and non-string cells give `Ok(None)`.
    pub fn lookup(&self, header: &str, row: RowNumber) -> Result<Option<String>> {
        let col = self.column(header)?;
        self.cell(row, col)
    }

    /// Trimmed text at a known column
    pub fn cell(&self, row: RowNumber, col: u32) -> Result<Option<String>> {
        if row < 1 || row > self.max_row {
            return Err(ReqError::RowOutOfRange {
                row,
                max_row: self.max_row,
            });
        }

        Ok(self
            .cells
            .get(&(row, col))
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sheet {
        Sheet::from_rows(
            "Sheet1",
            &[
                vec![Some("编号"), Some("L1华为格式"), Some("L2华为格式")],
                vec![Some("1"), Some("  用户可以登录  "), Some("【需求描述】用户名登录")],
                vec![Some("2"), None, Some("   ")],
            ],
        )
    }

    #[test]
    fn test_lookup_trims_text() {
        let sheet = sample();
        assert_eq!(
            sheet.lookup("L1华为格式", 2).unwrap(),
            Some("用户可以登录".to_string())
        );
        assert_eq!(sheet.column("L2华为格式").unwrap(), 3);
    }

    #[test]
    fn test_lookup_empty_cells() {
        let sheet = sample();
        assert_eq!(sheet.lookup("L1华为格式", 3).unwrap(), None);
        assert_eq!(sheet.lookup("L2华为格式", 3).unwrap(), None);
    }

    #[test]
    fn test_header_must_match_exactly() {
        let sheet = sample();
        assert!(matches!(
            sheet.lookup("L1", 2),
            Err(ReqError::HeaderNotFound(h)) if h == "L1"
        ));
    }

    #[test]
    fn test_row_range_checked() {
        let sheet = sample();
        assert_eq!(sheet.max_row(), 3);
        assert!(matches!(
            sheet.lookup("L1华为格式", 4),
            Err(ReqError::RowOutOfRange { row: 4, max_row: 3 })
        ));
        assert!(matches!(
            sheet.lookup("L1华为格式", 0),
            Err(ReqError::RowOutOfRange { row: 0, .. })
        ));
        // The header row itself is addressable
        assert_eq!(
            sheet.lookup("L1华为格式", 1).unwrap(),
            Some("L1华为格式".to_string())
        );
    }

    #[test]
    fn test_open_missing_file() {
        let result = Sheet::open("/nonexistent/data.xlsx", None);
        assert!(matches!(result, Err(ReqError::NotFound(_))));
    }
}
