//! 作业评分上下文
//!
//! 封装"我正在评第几份作业"这一信息

use std::fmt::Display;

use crate::utils::logging::truncate_text;

/// 作业评分上下文
#[derive(Debug, Clone)]
pub struct GradingCtx {
    /// 作业序号（从1开始，仅用于日志显示）
    pub submission_index: usize,

    /// 作业图片地址
    pub image_url: String,
}

impl GradingCtx {
    /// 创建新的评分上下文
    pub fn new(submission_index: usize, image_url: impl Into<String>) -> Self {
        Self {
            submission_index,
            image_url: image_url.into(),
        }
    }
}

impl Display for GradingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[作业 #{} {}]",
            self.submission_index,
            truncate_text(&self.image_url, 40)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = GradingCtx::new(3, "https://a.com/x.jpg");
        assert_eq!(ctx.to_string(), "[作业 #3 https://a.com/x.jpg]");
    }
}
