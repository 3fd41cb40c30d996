//! 作业评分流程 - 流程层
//!
//! 核心职责：定义"一份作业"的完整评分流程
//!
//! 流程顺序：
//! 1. 识别文字 → 规则评分 → 保存
//! 2. （备用分支）大模型看图评分 → 保存

use std::fmt::Display;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{AppResult, GradeError};
use crate::grading::{grade_from_reply, segmenter, Grader, ScoringPolicy};
use crate::models::{GradeRecord, GradeRequest, GradeResponse};
use crate::services::{MultimodalGrader, ResultStore, TextRecognizer};
use crate::utils::logging::truncate_text;
use crate::workflow::grading_ctx::GradingCtx;

/// 评分流程所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingState {
    Idle,
    OcrRequested,
    OcrSucceeded,
    OcrFailed,
    Scored,
    ModelRequested,
    ModelResponded,
    ModelFailed,
    Done,
}

impl Display for GradingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GradingState::Idle => "空闲",
            GradingState::OcrRequested => "等待文字识别",
            GradingState::OcrSucceeded => "文字识别完成",
            GradingState::OcrFailed => "文字识别失败",
            GradingState::Scored => "评分完成",
            GradingState::ModelRequested => "等待模型评分",
            GradingState::ModelResponded => "模型已回复",
            GradingState::ModelFailed => "模型调用失败",
            GradingState::Done => "结束",
        };
        f.write_str(name)
    }
}

/// 单次评分经过的阶段
struct StateTrace<'a> {
    ctx: &'a GradingCtx,
    states: Vec<GradingState>,
}

impl<'a> StateTrace<'a> {
    fn new(ctx: &'a GradingCtx) -> Self {
        Self {
            ctx,
            states: vec![GradingState::Idle],
        }
    }

    fn enter(&mut self, state: GradingState) {
        debug!("{} 状态: {}", self.ctx, state);
        self.states.push(state);
    }
}

/// 作业评分流程
///
/// - 编排完整的评分流程
/// - 决定走识别分支还是模型分支
/// - 不持有任何资源，外部服务在构造时注入
pub struct GradingFlow {
    recognizer: Arc<dyn TextRecognizer>,
    model: Arc<dyn MultimodalGrader>,
    store: Arc<dyn ResultStore>,
    grader: Grader,
}

impl GradingFlow {
    /// 创建新的评分流程
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        model: Arc<dyn MultimodalGrader>,
        store: Arc<dyn ResultStore>,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            recognizer,
            model,
            store,
            grader: Grader::new(policy),
        }
    }

    /// 评分一份作业
    ///
    /// # 参数
    /// - `request`: 评分请求
    /// - `ctx`: 评分上下文（仅用于日志）
    ///
    /// # 返回
    /// 成功时返回评分结果，否则返回唯一的错误
    pub async fn run(&self, request: &GradeRequest, ctx: &GradingCtx) -> AppResult<GradeResponse> {
        self.run_traced(request, ctx).await.0
    }

    /// 评分一份作业，并返回经过的阶段
    pub async fn run_traced(
        &self,
        request: &GradeRequest,
        ctx: &GradingCtx,
    ) -> (AppResult<GradeResponse>, Vec<GradingState>) {
        let mut trace = StateTrace::new(ctx);

        let result = if request.use_alternate_model {
            self.run_model_branch(request, &mut trace).await
        } else {
            self.run_ocr_branch(request, &mut trace).await
        };

        let result = match result {
            Ok(response) => self.persist(request, response, ctx).await,
            Err(e) => Err(e),
        };

        trace.enter(GradingState::Done);

        match &result {
            Ok(response) => info!("{} ✓ 评分完成，得分 {}", ctx, response.grade),
            Err(e) => error!("{} ❌ 评分失败: {}", ctx, e),
        }

        (result, trace.states)
    }

    // ========== 分支 1: 文字识别 + 规则评分 ==========

    async fn run_ocr_branch(
        &self,
        request: &GradeRequest,
        trace: &mut StateTrace<'_>,
    ) -> AppResult<GradeResponse> {
        let ctx = trace.ctx;
        info!("{} 🔍 正在识别文字 ({})...", ctx, self.recognizer.name());
        trace.enter(GradingState::OcrRequested);

        let text = match self.recognizer.recognize(&request.image_url).await {
            Ok(text) => text,
            Err(e) => {
                trace.enter(GradingState::OcrFailed);
                return Err(GradeError::provider(self.recognizer.name(), e));
            }
        };

        if segmenter::is_blank(&text) {
            warn!("{} ⚠️ 图片中没有识别到文字", ctx);
            trace.enter(GradingState::OcrFailed);
            return Err(GradeError::NoTextDetected);
        }

        trace.enter(GradingState::OcrSucceeded);
        info!(
            "{} ✓ 识别完成: {}",
            ctx,
            truncate_text(&text.replace(['\r', '\n'], " "), 60)
        );

        let result = self.grader.grade(&text);
        trace.enter(GradingState::Scored);

        Ok(GradeResponse::new(result, text))
    }

    // ========== 分支 2: 大模型直接评分 ==========

    async fn run_model_branch(
        &self,
        request: &GradeRequest,
        trace: &mut StateTrace<'_>,
    ) -> AppResult<GradeResponse> {
        let ctx = trace.ctx;
        info!("{} 🤖 使用模型 {} 直接评分...", ctx, self.model.name());
        trace.enter(GradingState::ModelRequested);

        let reply = match self.model.grade_image(&request.image_url).await {
            Ok(reply) => reply,
            Err(e) => {
                trace.enter(GradingState::ModelFailed);
                return Err(GradeError::provider(self.model.name(), e));
            }
        };

        trace.enter(GradingState::ModelResponded);
        let result = grade_from_reply(&reply);

        Ok(GradeResponse::new(result, String::new()))
    }

    /// 保存评分结果，保存失败时整个请求视为失败
    async fn persist(
        &self,
        request: &GradeRequest,
        response: GradeResponse,
        ctx: &GradingCtx,
    ) -> AppResult<GradeResponse> {
        let record = GradeRecord::new(&request.image_url, &response);
        self.store
            .save(&record)
            .await
            .map_err(|e| GradeError::persistence(self.store.target(), e))?;
        debug!("{} 结果已保存至 {}", ctx, self.store.target());
        Ok(response)
    }
}
