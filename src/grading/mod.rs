//! 评分核心
//!
//! 纯同步计算，不持有任何共享状态：
//!
//! ```text
//! 识别文本 → segmenter (切行) → outcome (关系式/求值/兜底) → scoring (汇总) → GradeResult
//! ```
//!
//! 另有 `model_reply`，用于大模型直接给分的分支

pub mod evaluator;
pub mod fallback;
pub mod feedback;
pub mod model_reply;
pub mod outcome;
pub mod relation;
pub mod scoring;
pub mod segmenter;

pub use evaluator::{evaluate, EvaluationError};
pub use feedback::Locale;
pub use model_reply::{grade_from_reply, ModelReply};
pub use outcome::{classify_line, LineOutcome};
pub use relation::{parse_relation, ParsedRelation, RelationalOperator};
pub use scoring::{GradeResult, ScoreCard, ScoringPolicy, UnparsablePolicy};

use tracing::debug;

/// 规则评分器
#[derive(Debug, Clone, Copy, Default)]
pub struct Grader {
    policy: ScoringPolicy,
}

impl Grader {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    /// 切行并逐行分类
    pub fn classify<'a>(&self, text: &'a str) -> Vec<(&'a str, LineOutcome)> {
        segmenter::split_lines(text)
            .map(|line| (line, classify_line(line)))
            .collect()
    }

    /// 对识别文本评分
    ///
    /// 空白文本直接返回 0 分和固定评语
    pub fn grade(&self, text: &str) -> GradeResult {
        if segmenter::is_blank(text) {
            debug!("识别文本为空");
            return GradeResult {
                grade: 0,
                feedback: self.policy.locale.nothing_recognized().to_string(),
            };
        }

        let mut card = ScoreCard::new(self.policy);
        for line in segmenter::split_lines(text) {
            let outcome = classify_line(line);
            card.record(line, &outcome);
        }

        debug!(
            "共 {} 行，计分 {} 行，得分 {}",
            card.line_count(),
            card.counted(),
            card.grade()
        );
        card.finish()
    }
}

/// 使用默认策略（不计无法解析的行、中文评语）评分
pub fn evaluate_math_expression(text: &str) -> GradeResult {
    Grader::default().grade(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_lines(feedback: &str) -> Vec<&str> {
        feedback
            .split_once("详细反馈：\n")
            .map(|(_, body)| body.lines().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_empty_input() {
        for text in ["", "   ", "\n\t \r\n"] {
            let result = evaluate_math_expression(text);
            assert_eq!(result.grade, 0);
            assert_eq!(result.feedback, "未能识别到任何内容。");
        }
    }

    #[test]
    fn test_single_correct_line() {
        let result = evaluate_math_expression("2+2=4");
        assert_eq!(result.grade, 100);
        assert_eq!(
            result.feedback,
            "总体得分：100\n\n详细反馈：\n表达式 \"2+2=4\" 正确！"
        );
    }

    #[test]
    fn test_bare_value_feedback() {
        let result = evaluate_math_expression("3*3");
        assert_eq!(result.grade, 50);
        assert!(result.feedback.contains("的计算结果是 9。"));
    }

    #[test]
    fn test_mixed_lines_exclude_policy() {
        let result = evaluate_math_expression("2+2=4; 3*3; hello");
        assert_eq!(result.grade, 75);
        let lines = detail_lines(&result.feedback);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "无法解析 \"hello\" 为数学表达式。");
    }

    #[test]
    fn test_mixed_lines_include_policy() {
        let grader = Grader::new(ScoringPolicy::new(UnparsablePolicy::Include, Locale::Zh));
        assert_eq!(grader.grade("2+2=4; 3*3; hello").grade, 50);
    }

    #[test]
    fn test_feedback_count_matches_lines() {
        let text = "1+1=2\n2+2=5,,7*6;\n\nabc 3; xyz ; 4>3";
        let grader = Grader::default();
        let result = grader.grade(text);
        let expected = segmenter::split_lines(text).count();
        assert_eq!(expected, 6);
        assert_eq!(detail_lines(&result.feedback).len(), expected);
        assert_eq!(grader.classify(text).len(), expected);
    }

    #[test]
    fn test_feedback_in_input_order() {
        let result = evaluate_math_expression("3*3\n2+2=5");
        let lines = detail_lines(&result.feedback);
        assert!(lines[0].contains("3*3"));
        assert!(lines[1].contains("左边 = 4，右边 = 5"));
    }

    #[test]
    fn test_idempotent() {
        let text = "2+2=4; 3*3; abc 12 def 8; hello";
        assert_eq!(evaluate_math_expression(text), evaluate_math_expression(text));
    }

    #[test]
    fn test_only_unparsable_lines() {
        let result = evaluate_math_expression("hello; world");
        assert_eq!(result.grade, 0);
        assert_eq!(detail_lines(&result.feedback).len(), 2);
    }

    #[test]
    fn test_deep_nesting_falls_back() {
        let line = format!("{}1{}=1", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            classify_line(&line),
            LineOutcome::NumericFallback {
                numbers: vec![1.0, 1.0],
                sum: 2.0
            }
        );

        let result = evaluate_math_expression(&line);
        assert_eq!(result.grade, 25);
        assert_eq!(detail_lines(&result.feedback).len(), 1);
    }

    #[test]
    fn test_pathological_lines_yield_one_sentence() {
        let cases = [
            (format!("{}1{}=1", "(".repeat(10_000), ")".repeat(10_000)), 25),
            (format!("{}1", "-".repeat(100_000)), 25),
            (format!("2{}", "^2".repeat(10_000)), 25),
            (format!("{}1{}", "sqrt(".repeat(5_000), ")".repeat(5_000)), 25),
            (format!("1{}", "+1".repeat(100_000)), 50),
            (format!("1{}=100001", "+1".repeat(100_000)), 100),
            ("9".repeat(400), 50),
            ("(".repeat(50_000), 0),
            (")".repeat(50_000), 0),
            ("x".repeat(100_000), 0),
            ("!".repeat(1_000), 0),
            ("3!!!!".to_string(), 25),
        ];

        for (line, expected) in cases {
            let preview: String = line.chars().take(20).collect();
            for policy in [UnparsablePolicy::Exclude, UnparsablePolicy::Include] {
                let grader = Grader::new(ScoringPolicy::new(policy, Locale::Zh));
                let result = grader.grade(&line);
                assert_eq!(result.grade, expected, "{}...", preview);
                assert_eq!(detail_lines(&result.feedback).len(), 1, "{}...", preview);
            }
        }
    }

    #[test]
    fn test_english_locale() {
        let grader = Grader::new(ScoringPolicy::new(UnparsablePolicy::Exclude, Locale::En));
        let result = grader.grade("2+2=5");
        assert_eq!(result.grade, 0);
        assert!(result
            .feedback
            .contains("Left side = 4, right side = 5"));
        assert_eq!(grader.grade(" ").feedback, "Nothing was recognized.");
    }
}
