//! reqsplit extract - requirement text from spreadsheets and section markers
//!
//! Builds the pipeline's JSON inputs: the original requirements of the L1
//! column, the reference descriptions grouped under each L1 row, and the
//! concatenated `【需求描述】` text of model decompositions.

pub mod extractor;
pub mod sheet;

pub use extractor::{
    extract_content, extract_descriptions, group_reference_blocks, metric_records_from_decompositions,
    read_requirement, requirements_from_sheet, DESCRIPTION_FIELD,
};
pub use sheet::Sheet;
