//! 单行分类
//!
//! 关系式 → 判对错；单个表达式 → 给出结果；求值失败 → 数字兜底

use tracing::warn;

use super::evaluator::{evaluate, EvaluationError};
use super::fallback::extract_numbers;
use super::relation::{parse_relation, ParsedRelation, RelationalOperator};

/// 等式比较的绝对误差
pub const EQ_TOLERANCE: f64 = 1e-4;

/// 一行的分类结果
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// 关系式成立
    RelationCorrect { left: f64, right: f64 },
    /// 关系式不成立
    RelationIncorrect { left: f64, right: f64 },
    /// 没有关系运算符，只算出了结果
    BareValue(f64),
    /// 求值失败，但找到了数字
    NumericFallback { numbers: Vec<f64>, sum: f64 },
    /// 什么都解析不出来
    Unparsable,
}

impl LineOutcome {
    /// 单行得分
    pub fn score(&self) -> u32 {
        match self {
            LineOutcome::RelationCorrect { .. } => 100,
            LineOutcome::RelationIncorrect { .. } => 0,
            LineOutcome::BareValue(_) => 50,
            LineOutcome::NumericFallback { .. } => 25,
            LineOutcome::Unparsable => 0,
        }
    }
}

/// 比较两边的求值结果
pub fn compare(operator: RelationalOperator, left: f64, right: f64) -> bool {
    let within_tolerance = (left - right).abs() < EQ_TOLERANCE;
    match operator {
        RelationalOperator::Eq => within_tolerance,
        RelationalOperator::Neq => !within_tolerance,
        RelationalOperator::Lt => left < right,
        RelationalOperator::Lte => left <= right,
        RelationalOperator::Gt => left > right,
        RelationalOperator::Gte => left >= right,
    }
}

fn evaluate_relation(relation: &ParsedRelation<'_>) -> Result<LineOutcome, EvaluationError> {
    let left = evaluate(relation.left)?;
    let right = evaluate(relation.right)?;

    if compare(relation.operator, left, right) {
        Ok(LineOutcome::RelationCorrect { left, right })
    } else {
        Ok(LineOutcome::RelationIncorrect { left, right })
    }
}

fn evaluate_line(line: &str) -> Result<LineOutcome, EvaluationError> {
    match parse_relation(line) {
        Some(relation) => evaluate_relation(&relation),
        None => evaluate(line).map(LineOutcome::BareValue),
    }
}

/// 对一行（已去除首尾空白、非空）进行分类
pub fn classify_line(line: &str) -> LineOutcome {
    match evaluate_line(line) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("表达式 \"{}\" 求值失败 ({})，尝试提取数字", line, err);
            match extract_numbers(line) {
                Some(extracted) => LineOutcome::NumericFallback {
                    numbers: extracted.numbers,
                    sum: extracted.sum,
                },
                None => LineOutcome::Unparsable,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_correct() {
        assert_eq!(
            classify_line("2+2=4"),
            LineOutcome::RelationCorrect {
                left: 4.0,
                right: 4.0
            }
        );
    }

    #[test]
    fn test_relation_incorrect() {
        let outcome = classify_line("2+2=5");
        assert_eq!(
            outcome,
            LineOutcome::RelationIncorrect {
                left: 4.0,
                right: 5.0
            }
        );
        assert_eq!(outcome.score(), 0);
    }

    #[test]
    fn test_bare_value() {
        let outcome = classify_line("3*3");
        assert_eq!(outcome, LineOutcome::BareValue(9.0));
        assert_eq!(outcome.score(), 50);
    }

    #[test]
    fn test_numeric_fallback() {
        let outcome = classify_line("abc 12 def 8");
        assert_eq!(
            outcome,
            LineOutcome::NumericFallback {
                numbers: vec![12.0, 8.0],
                sum: 20.0
            }
        );
        assert_eq!(outcome.score(), 25);
    }

    #[test]
    fn test_unparsable() {
        assert_eq!(classify_line("hello"), LineOutcome::Unparsable);
    }

    #[test]
    fn test_failed_operand_falls_back() {
        assert_eq!(
            classify_line("x+1=5"),
            LineOutcome::NumericFallback {
                numbers: vec![1.0, 5.0],
                sum: 6.0
            }
        );
    }

    #[test]
    fn test_eq_tolerance_boundary() {
        assert!(matches!(
            classify_line("0.00005+0=0.0001"),
            LineOutcome::RelationCorrect { .. }
        ));
        assert!(matches!(
            classify_line("0+0=0.001"),
            LineOutcome::RelationIncorrect { .. }
        ));
    }

    #[test]
    fn test_neq_uses_tolerance() {
        assert!(matches!(
            classify_line("1!=1.00001"),
            LineOutcome::RelationIncorrect { .. }
        ));
        assert!(matches!(
            classify_line("1!=2"),
            LineOutcome::RelationCorrect { .. }
        ));
    }

    #[test]
    fn test_ordering_operators_compare_numbers() {
        assert!(matches!(classify_line("1<2"), LineOutcome::RelationCorrect { .. }));
        assert!(matches!(classify_line("2<=2"), LineOutcome::RelationCorrect { .. }));
        assert!(matches!(classify_line("10<=9"), LineOutcome::RelationIncorrect { .. }));
        assert!(matches!(classify_line("3>2"), LineOutcome::RelationCorrect { .. }));
        assert!(matches!(classify_line("2>=3"), LineOutcome::RelationIncorrect { .. }));
        assert!(matches!(
            classify_line("2*3 <= 3+3"),
            LineOutcome::RelationCorrect { .. }
        ));
    }

    #[test]
    fn test_lt_has_no_tolerance() {
        assert!(matches!(
            classify_line("1<1.00001"),
            LineOutcome::RelationCorrect { .. }
        ));
    }
}
