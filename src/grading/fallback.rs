//! 数字兜底提取
//!
//! 表达式求值失败时，从原文中找出所有数字并求和，给一点基础分

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?\d*\.?\d+").expect("数字正则无效")
});

/// 提取到的数字及其和
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedNumbers {
    pub numbers: Vec<f64>,
    pub sum: f64,
}

/// 按出现顺序提取一行中的所有数字
///
/// 一个都没有时返回 `None`。任何输入都不会出错。
pub fn extract_numbers(line: &str) -> Option<ExtractedNumbers> {
    let numbers: Vec<f64> = NUMBER_RE
        .find_iter(line)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    if numbers.is_empty() {
        return None;
    }

    let sum = numbers.iter().sum();
    Some(ExtractedNumbers { numbers, sum })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_and_sum() {
        let extracted = extract_numbers("abc 12 def 8").unwrap();
        assert_eq!(extracted.numbers, vec![12.0, 8.0]);
        assert_eq!(extracted.sum, 20.0);
    }

    #[test]
    fn test_signs_and_decimals() {
        let extracted = extract_numbers("x -3 y +1.5 z .5").unwrap();
        assert_eq!(extracted.numbers, vec![-3.0, 1.5, 0.5]);
        assert_eq!(extracted.sum, -1.0);
    }

    #[test]
    fn test_no_numbers() {
        assert_eq!(extract_numbers("hello"), None);
        assert_eq!(extract_numbers(""), None);
        assert_eq!(extract_numbers("+-."), None);
    }

    #[test]
    fn test_operator_text_with_numbers() {
        let extracted = extract_numbers("3×3").unwrap();
        assert_eq!(extracted.numbers, vec![3.0, 3.0]);
        assert_eq!(extracted.sum, 6.0);
    }
}
