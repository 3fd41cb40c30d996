//! 评分结果保存服务 - 业务能力层
//!
//! 只负责"写结果文件"能力，不关心流程

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::GradeRecord;
use crate::services::providers::ResultStore;

/// JSON Lines 结果文件
///
/// 职责：
/// - 每条评分记录追加为一行 JSON
/// - 只处理单条记录
/// - 不关心流程顺序
pub struct JsonlResultStore {
    path: String,
    /// 并发任务共用一个文件，写入需要排队
    write_lock: Mutex<()>,
}

impl JsonlResultStore {
    /// 使用指定文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl ResultStore for JsonlResultStore {
    fn target(&self) -> &str {
        &self.path
    }

    /// 追加一条评分记录
    ///
    /// # 参数
    /// - `record`: 评分记录
    ///
    /// # 返回
    /// 写入失败时返回错误
    async fn save(&self, record: &GradeRecord) -> Result<()> {
        debug!(
            "保存评分记录: {} | 得分 {} | 写入 {}",
            record.image_url, record.grade, self.path
        );

        let mut line = serde_json::to_string(record).context("无法序列化评分记录")?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开结果文件: {}", self.path))?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
