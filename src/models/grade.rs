use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::grading::GradeResult;

/// 评分成功的响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResponse {
    pub grade: u32,
    pub feedback: String,
    /// 大模型分支为空字符串
    pub recognized_text: String,
}

impl GradeResponse {
    pub fn new(result: GradeResult, recognized_text: impl Into<String>) -> Self {
        Self {
            grade: result.grade,
            feedback: result.feedback,
            recognized_text: recognized_text.into(),
        }
    }
}

/// 评分失败的响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub detail: String,
}

impl ErrorBody {
    /// 对应的 HTTP 状态码
    pub fn status(&self) -> u16 {
        500
    }
}

impl From<&GradeError> for ErrorBody {
    fn from(err: &GradeError) -> Self {
        Self {
            message: "Internal server error".to_string(),
            detail: err.to_string(),
        }
    }
}

/// 交给持久化服务保存的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub image_url: String,
    pub grade: u32,
    pub feedback: String,
    pub recognized_text: String,
    /// RFC 3339 时间
    pub graded_at: String,
}

impl GradeRecord {
    pub fn new(image_url: impl Into<String>, response: &GradeResponse) -> Self {
        Self {
            image_url: image_url.into(),
            grade: response.grade,
            feedback: response.feedback.clone(),
            recognized_text: response.recognized_text.clone(),
            graded_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// 单个作业的最终输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SubmissionOutcome {
    Graded(GradeResponse),
    Failed(ErrorBody),
}

impl From<Result<GradeResponse, GradeError>> for SubmissionOutcome {
    fn from(result: Result<GradeResponse, GradeError>) -> Self {
        match result {
            Ok(response) => SubmissionOutcome::Graded(response),
            Err(err) => SubmissionOutcome::Failed(ErrorBody::from(&err)),
        }
    }
}

impl SubmissionOutcome {
    pub fn is_graded(&self) -> bool {
        matches!(self, SubmissionOutcome::Graded(_))
    }
}
