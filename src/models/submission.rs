use serde::{Deserialize, Serialize};

/// 一次评分请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    /// 作业图片地址
    #[serde(alias = "image_url")]
    pub image_url: String,
    /// 是否改用大模型直接评分
    #[serde(default, alias = "use_alternate_model")]
    pub use_alternate_model: bool,
}

impl GradeRequest {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            use_alternate_model: false,
        }
    }

    pub fn with_model(mut self, use_alternate_model: bool) -> Self {
        self.use_alternate_model = use_alternate_model;
        self
    }
}

/// 一个 TOML 文件里的一批作业
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionBatch {
    #[serde(default)]
    pub submissions: Vec<GradeRequest>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}
