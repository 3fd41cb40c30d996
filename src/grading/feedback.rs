//! 评语模板

use std::fmt;
use std::str::FromStr;

use super::outcome::LineOutcome;

/// 评语语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// 简体中文
    #[default]
    Zh,
    /// 英语
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zh" | "zh-cn" | "zh_cn" | "chs" => Ok(Locale::Zh),
            "en" | "en-us" | "en_us" | "eng" => Ok(Locale::En),
            other => Err(format!("不支持的语言: {}", other)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Zh => f.write_str("zh"),
            Locale::En => f.write_str("en"),
        }
    }
}

/// 数字显示：整数不带小数点，无穷大写成 Infinity，
/// 绝对值不小于 1e21 或小于 1e-6 时用科学计数法（`1e+21`、`1.5e-7`）
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if value == 0.0 {
        // 去掉 -0 的符号
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let formatted = format!("{:e}", value);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        }
    } else {
        value.to_string()
    }
}

impl Locale {
    /// 识别结果为空时的固定评语
    pub fn nothing_recognized(self) -> &'static str {
        match self {
            Locale::Zh => "未能识别到任何内容。",
            Locale::En => "Nothing was recognized.",
        }
    }

    /// 单行评语
    pub fn line_feedback(self, line: &str, outcome: &LineOutcome) -> String {
        match (self, outcome) {
            (Locale::Zh, LineOutcome::RelationCorrect { .. }) => {
                format!("表达式 \"{}\" 正确！", line)
            }
            (Locale::Zh, LineOutcome::RelationIncorrect { left, right }) => format!(
                "表达式 \"{}\" 不正确。左边 = {}，右边 = {}",
                line,
                format_number(*left),
                format_number(*right)
            ),
            (Locale::Zh, LineOutcome::BareValue(value)) => {
                format!("表达式 \"{}\" 的计算结果是 {}。", line, format_number(*value))
            }
            (Locale::Zh, LineOutcome::NumericFallback { numbers, sum }) => format!(
                "在 \"{}\" 中找到了以下数字：{}。这些数字的和是 {}。",
                line,
                join_numbers(numbers),
                format_number(*sum)
            ),
            (Locale::Zh, LineOutcome::Unparsable) => {
                format!("无法解析 \"{}\" 为数学表达式。", line)
            }
            (Locale::En, LineOutcome::RelationCorrect { .. }) => {
                format!("Expression \"{}\" is correct!", line)
            }
            (Locale::En, LineOutcome::RelationIncorrect { left, right }) => format!(
                "Expression \"{}\" is incorrect. Left side = {}, right side = {}",
                line,
                format_number(*left),
                format_number(*right)
            ),
            (Locale::En, LineOutcome::BareValue(value)) => format!(
                "Expression \"{}\" evaluates to {}.",
                line,
                format_number(*value)
            ),
            (Locale::En, LineOutcome::NumericFallback { numbers, sum }) => format!(
                "Found these numbers in \"{}\": {}. Their sum is {}.",
                line,
                join_numbers(numbers),
                format_number(*sum)
            ),
            (Locale::En, LineOutcome::Unparsable) => {
                format!("Could not parse \"{}\" as a math expression.", line)
            }
        }
    }

    /// 整体评语：总分 + 逐行评语
    pub fn transcript(self, grade: u32, lines: &[String]) -> String {
        let body = lines.join("\n");
        match self {
            Locale::Zh => format!("总体得分：{}\n\n详细反馈：\n{}", grade, body),
            Locale::En => format!("Overall score: {}\n\nDetailed feedback:\n{}", grade, body),
        }
    }
}

fn join_numbers(numbers: &[f64]) -> String {
    numbers
        .iter()
        .map(|n| format_number(*n))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_format_number_exponent_range() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(123456.0), "123456");
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("zh".parse::<Locale>(), Ok(Locale::Zh));
        assert_eq!(" EN ".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_incorrect_mentions_both_sides() {
        let text = Locale::Zh.line_feedback(
            "2+2=5",
            &LineOutcome::RelationIncorrect {
                left: 4.0,
                right: 5.0,
            },
        );
        assert_eq!(text, "表达式 \"2+2=5\" 不正确。左边 = 4，右边 = 5");
    }

    #[test]
    fn test_fallback_lists_numbers() {
        let text = Locale::Zh.line_feedback(
            "abc 12 def 8",
            &LineOutcome::NumericFallback {
                numbers: vec![12.0, 8.0],
                sum: 20.0,
            },
        );
        assert_eq!(
            text,
            "在 \"abc 12 def 8\" 中找到了以下数字：12, 8。这些数字的和是 20。"
        );
    }

    #[test]
    fn test_english_transcript() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            Locale::En.transcript(75, &lines),
            "Overall score: 75\n\nDetailed feedback:\na\nb"
        );
    }
}
