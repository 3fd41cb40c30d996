//! 大模型评分回复解析
//!
//! 从模型的自由文本里找出 "评分: NN" 这类标记，剩余部分原样作为评语

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::scoring::GradeResult;

/// 评分标记，支持中英文及全角冒号；英文单词需完整匹配
static GRADE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:评分|得分|\bgrade|\bscore)\s*[:：]\s*(\d+)").expect("评分标记正则无效")
});

/// 模型回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// 正常文本
    Text(String),
    /// 模型拒绝回答
    Refusal(String),
    /// 没有任何内容
    Empty,
}

impl ModelReply {
    /// 可用于评分的文本，非文本回复视为空
    pub fn text(&self) -> &str {
        match self {
            ModelReply::Text(text) => text,
            ModelReply::Refusal(_) | ModelReply::Empty => "",
        }
    }
}

/// 从回复文本中提取分数（0-100），找不到时为 0
pub fn extract_grade(reply: &str) -> u32 {
    let Some(digits) = GRADE_MARKER_RE
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        return 0;
    };

    // 位数过多解析失败时同样视为超出上限
    let grade = digits.parse::<u32>().unwrap_or(u32::MAX);
    if grade > 100 {
        warn!("模型给出的分数 {} 超出范围，按 100 处理", digits);
        return 100;
    }
    grade
}

/// 把模型回复转成评分结果
///
/// 评语为去掉第一个评分标记后的全文（去除首尾空白）
pub fn grade_from_reply(reply: &ModelReply) -> GradeResult {
    if let ModelReply::Refusal(reason) = reply {
        warn!("模型拒绝评分: {}", reason);
    }

    let text = reply.text();
    GradeResult {
        grade: extract_grade(text),
        feedback: GRADE_MARKER_RE.replace(text, "").trim().to_string(),
    }
}
