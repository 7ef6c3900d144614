//! Flat JSON file storage for pipeline stages
//!
//! Every stage rewrites its whole output file at the end of a run. Files are
//! pretty-printed with two-space indentation and keep non-ASCII text literal.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::{DecompositionResult, MetricRecord, ReqError, Requirement, Result, RowNumber};

/// Read and deserialize a JSON file
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReqError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| ReqError::InvalidInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Serialize `value` as pretty JSON and write it to `path`
pub async fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).await?;

    debug!("Wrote {:?}", path);
    Ok(())
}

/// Load `[{row, req}]`, keeping only the first `limit` entries when given
///
/// Every element must carry both keys; otherwise the whole file is rejected.
pub async fn load_requirements(path: &Path, limit: Option<usize>) -> Result<Vec<Requirement>> {
    let mut requirements: Vec<Requirement> = load_json(path).await?;

    match limit {
        Some(limit) if limit > 0 => {
            requirements.truncate(limit);
            info!(
                "Loaded first {} requirements from {:?}",
                requirements.len(),
                path
            );
        }
        _ => info!("Loaded {} requirements from {:?}", requirements.len(), path),
    }

    Ok(requirements)
}

/// Load `[{row, req}]` as a row -> requirement map
///
/// Later duplicates of a row replace earlier ones.
pub async fn load_requirement_map(path: &Path) -> Result<BTreeMap<RowNumber, String>> {
    let requirements: Vec<Requirement> = load_json(path).await?;
    let map: BTreeMap<_, _> = requirements.into_iter().map(|r| (r.row, r.req)).collect();

    info!("Loaded {} original requirements from {:?}", map.len(), path);
    Ok(map)
}

/// Load a decomposition output file
pub async fn load_decompositions(path: &Path) -> Result<Vec<DecompositionResult>> {
    let results: Vec<DecompositionResult> = load_json(path).await?;
    info!("Loaded {} decomposition results from {:?}", results.len(), path);
    Ok(results)
}

/// Load metric records as a row -> concatenated text map
///
/// Records with empty text are left out.
pub async fn load_descriptions(path: &Path) -> Result<BTreeMap<RowNumber, String>> {
    let records: Vec<MetricRecord> = load_json(path).await?;
    let total = records.len();

    let map: BTreeMap<_, _> = records
        .into_iter()
        .filter(|r| !r.concatenated.is_empty())
        .map(|r| (r.row, r.concatenated))
        .collect();

    if map.len() < total {
        warn!(
            "Ignored {} records with empty text in {:?}",
            total - map.len(),
            path
        );
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubRequirement;
    use tempfile::tempdir;

    fn sample_results() -> Vec<DecompositionResult> {
        vec![
            DecompositionResult::new(
                2,
                vec![
                    SubRequirement::new("1", "【需求描述】用户名登录"),
                    SubRequirement::new("2", "【需求描述】手机号登录"),
                ],
            ),
            DecompositionResult::new(5, vec![SubRequirement::new("a", "【需求描述】查看余额")]),
        ]
    }

    #[tokio::test]
    async fn test_decomposition_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/decomposed.json");

        let results = sample_results();
        save_json(&path, &results).await.unwrap();

        let loaded = load_decompositions(&path).await.unwrap();
        assert_eq!(loaded, results);
    }

    #[tokio::test]
    async fn test_saved_json_keeps_chinese_literal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("decomposed.json");

        save_json(&path, &sample_results()).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("用户名登录"));
        assert!(raw.contains("\n  {"));
    }

    #[tokio::test]
    async fn test_load_requirements_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"[{"row": 2, "req": "a"}, {"row": 3, "req": "b"}, {"row": 4, "req": "c"}]"#,
        )
        .unwrap();

        let all = load_requirements(&path, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let first_two = load_requirements(&path, Some(2)).await.unwrap();
        assert_eq!(first_two, vec![Requirement::new(2, "a"), Requirement::new(3, "b")]);

        let zero_means_all = load_requirements(&path, Some(0)).await.unwrap();
        assert_eq!(zero_means_all.len(), 3);
    }

    #[tokio::test]
    async fn test_load_requirements_rejects_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"[{"row": 2, "req": "a"}, {"row": 3}]"#).unwrap();

        let result = load_requirements(&path, None).await;
        assert!(matches!(result, Err(ReqError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_requirements(&dir.path().join("nope.json"), None).await;
        assert!(matches!(result, Err(ReqError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_descriptions_skips_empty_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("desc.json");
        let records = vec![
            MetricRecord::from_descriptions(1, &["a".to_string()]),
            MetricRecord::from_descriptions(2, &[]),
        ];
        save_json(&path, &records).await.unwrap();

        let map = load_descriptions(&path).await.unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1).map(String::as_str), Some("a"));
    }

    #[tokio::test]
    async fn test_requirement_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"[{"row": 7, "req": "登录"}]"#).unwrap();

        let map = load_requirement_map(&path).await.unwrap();
        assert_eq!(map.get(&7).map(String::as_str), Some("登录"));
    }
}
