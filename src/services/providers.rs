//! 外部服务接口
//!
//! 流程层只依赖这些 trait，具体实现在构造时注入

use anyhow::Result;
use async_trait::async_trait;

use crate::grading::ModelReply;
use crate::models::GradeRecord;

/// 文字识别服务
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// 识别图片中的文字，没有文字时返回空字符串
    async fn recognize(&self, image_url: &str) -> Result<String>;
}

/// 多模态评分服务
#[async_trait]
pub trait MultimodalGrader: Send + Sync {
    fn name(&self) -> &str;

    /// 让模型直接看图评分
    async fn grade_image(&self, image_url: &str) -> Result<ModelReply>;
}

/// 评分结果保存服务
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// 保存位置描述，用于日志和错误信息
    fn target(&self) -> &str;

    async fn save(&self, record: &GradeRecord) -> Result<()>;
}
