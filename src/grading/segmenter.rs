//! 文本切分
//!
//! 把识别出的原始文本切成若干条待评分的表达式行

/// 行分隔符：逗号、分号、换行（含回车）
fn is_separator(c: char) -> bool {
    matches!(c, ',' | ';' | '\n' | '\r')
}

/// 判断识别文本是否为空
///
/// 所有连续空白折叠成一个空格后再判断，只用于整体判空，不参与切分
pub fn is_blank(text: &str) -> bool {
    text.split_whitespace().next().is_none()
}

/// 把识别文本切分成表达式行
///
/// 按逗号/分号/换行的连续片段切分，每段去掉首尾空白，空段直接丢弃。
/// 输出顺序与原文出现顺序一致。
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.split(is_separator)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}
