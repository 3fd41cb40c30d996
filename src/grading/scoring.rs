//! 评分汇总
//!
//! 逐行累加得分和评语，最后取平均分（四舍五入）

use serde::{Deserialize, Serialize};

use super::feedback::Locale;
use super::outcome::LineOutcome;

/// 无法解析的行是否计入平均分的分母
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnparsablePolicy {
    /// 只写评语，不计入分母
    #[default]
    Exclude,
    /// 按 0 分计入分母
    Include,
}

/// 评分策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoringPolicy {
    pub unparsable: UnparsablePolicy,
    pub locale: Locale,
}

impl ScoringPolicy {
    pub fn new(unparsable: UnparsablePolicy, locale: Locale) -> Self {
        Self { unparsable, locale }
    }

    /// 该行是否计入分母
    pub fn counts(&self, outcome: &LineOutcome) -> bool {
        match outcome {
            LineOutcome::Unparsable => self.unparsable == UnparsablePolicy::Include,
            _ => true,
        }
    }
}

/// 一次评分的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    /// 0-100
    pub grade: u32,
    pub feedback: String,
}

/// 评分卡
#[derive(Debug, Default)]
pub struct ScoreCard {
    policy: ScoringPolicy,
    total_score: u64,
    counted: u64,
    lines: Vec<String>,
}

impl ScoreCard {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// 记录一行的分类结果
    pub fn record(&mut self, line: &str, outcome: &LineOutcome) {
        if self.policy.counts(outcome) {
            self.total_score = self.total_score.saturating_add(u64::from(outcome.score()));
            self.counted = self.counted.saturating_add(1);
        }
        self.lines.push(self.policy.locale.line_feedback(line, outcome));
    }

    /// 已记录的行数（即评语句数）
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 计入分母的行数
    pub fn counted(&self) -> u64 {
        self.counted
    }

    /// 当前平均分，没有计分行时为 0
    pub fn grade(&self) -> u32 {
        if self.counted == 0 {
            return 0;
        }
        (self.total_score as f64 / self.counted as f64).round() as u32
    }

    pub fn finish(self) -> GradeResult {
        let grade = self.grade();
        GradeResult {
            grade,
            feedback: self.policy.locale.transcript(grade, &self.lines),
        }
    }
}
