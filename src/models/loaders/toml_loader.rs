use crate::models::submission::SubmissionBatch;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载一批作业
pub async fn load_submission_file(toml_file_path: &Path) -> Result<SubmissionBatch> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let mut batch: SubmissionBatch = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    batch.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(batch)
}

/// 从文件夹中加载所有 TOML 作业文件
///
/// 单个文件解析失败只记录警告，不影响其他文件
pub async fn load_all_submission_files(folder_path: &str) -> Result<Vec<SubmissionBatch>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    // read_dir 顺序不固定
    paths.sort();

    let mut batches = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_submission_file(&path).await {
            Ok(batch) => {
                tracing::info!("成功加载 {} 份作业", batch.submissions.len());
                batches.push(batch);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_all_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.toml"),
            r#"
            [[submissions]]
            image_url = "https://example.com/1.jpg"

            [[submissions]]
            image_url = "https://example.com/2.jpg"
            use_alternate_model = true
            "#,
        )
        .unwrap();
        std::fs::write(dir.path().join("b.toml"), "submissions = 3").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let batches = load_all_submission_files(dir.path().to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].submissions.len(), 2);
        assert!(batches[0].submissions[1].use_alternate_model);
        assert!(batches[0].file_path.as_deref().unwrap().ends_with("a.toml"));
    }

    #[test]
    fn test_load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.toml");
        std::fs::write(
            &path,
            "[[submissions]]\nimageUrl = \"https://example.com/a.png\"\n",
        )
        .unwrap();

        let batch = tokio_test::block_on(load_submission_file(&path)).unwrap();
        assert_eq!(batch.submissions.len(), 1);
        assert!(!batch.submissions[0].use_alternate_model);
    }

    #[tokio::test]
    async fn test_missing_folder() {
        assert!(load_all_submission_files("/definitely/not/here").await.is_err());
    }
}
