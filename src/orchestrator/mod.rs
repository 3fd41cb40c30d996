//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责组装外部服务、批量评分和并发调度。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<GradeRequest>)
//!     ↓
//! workflow::GradingFlow (处理单份作业)
//!     ↓
//! services (能力层：ocr / llm / result_store)
//!     ↓
//! infrastructure (基础设施：ImageFetcher)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源集中**：只有编排层创建 HTTP 客户端和外部服务
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体评分判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, BatchReport};
