//! # Homework Grader
//!
//! 识别作业图片中的算式并自动评分
//!
//! ## 架构设计
//!
//! ### ① 评分核心（Grading）
//! - `grading/` - 纯同步计算：切行 → 关系式解析 → 求值 → 兜底 → 汇总
//! - `Grader` - 规则评分器，`evaluate_math_expression` 为默认入口
//!
//! ### ② 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 HTTP 客户端，只暴露能力
//! - `ImageFetcher` - 下载图片
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单份作业
//! - `OcrService` - 文字识别能力
//! - `LlmService` - 大模型看图评分 / 转写能力
//! - `JsonlResultStore` - 保存评分结果能力
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一份作业"的完整评分流程
//! - `GradingCtx` - 上下文封装
//! - `GradingFlow` - 流程编排（识别 → 评分 → 保存，或模型评分 → 保存）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 组装服务、批量评分、并发控制
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod grading;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, OcrEngine};
pub use error::{AppResult, ConfigError, GradeError};
pub use grading::{evaluate_math_expression, GradeResult, Grader, Locale, ScoringPolicy, UnparsablePolicy};
pub use models::{ErrorBody, GradeRequest, GradeResponse, SubmissionOutcome};
pub use orchestrator::{App, BatchReport};
pub use workflow::{GradingCtx, GradingFlow, GradingState};
