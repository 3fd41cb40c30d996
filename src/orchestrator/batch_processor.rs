//! 批量作业评分器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 HTTP 客户端、外部服务和评分流程
//! 2. **批量加载**：扫描并加载所有待评分的作业
//! 3. **并发控制**：使用 Semaphore 限制并发数量
//! 4. **分批处理**：每批完成后再开始下一批
//! 5. **全局统计**：汇总所有作业的评分结果

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::{Config, OcrEngine};
use crate::infrastructure::ImageFetcher;
use crate::models::{load_all_submission_files, GradeRequest, SubmissionOutcome};
use crate::services::{JsonlResultStore, LlmService, OcrService, TextRecognizer};
use crate::utils::logging;
use crate::workflow::{GradingCtx, GradingFlow};

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<GradingFlow>,
}

impl App {
    /// 初始化应用，按配置组装外部服务
    pub fn initialize(config: Config) -> Result<Self> {
        let fetcher = ImageFetcher::new(Duration::from_secs(config.http_timeout_secs))?;
        let llm = Arc::new(LlmService::new(&config, fetcher));

        if config.require_llm_key().is_err() {
            warn!("⚠️ 未设置 LLM_API_KEY，大模型相关功能将无法使用");
        }

        let recognizer: Arc<dyn TextRecognizer> = match config.ocr_engine {
            OcrEngine::OcrSpace => Arc::new(OcrService::new(&config)?),
            OcrEngine::Llm => llm.clone(),
        };
        let store = Arc::new(JsonlResultStore::with_path(&config.results_file));

        let flow = GradingFlow::new(recognizer, llm, store, config.scoring_policy());

        Ok(Self::with_flow(config, flow))
    }

    /// 使用已组装好的评分流程
    pub fn with_flow(config: Config, flow: GradingFlow) -> Self {
        Self {
            config,
            flow: Arc::new(flow),
        }
    }

    /// 评分单份作业
    pub async fn grade_one(&self, request: &GradeRequest) -> SubmissionOutcome {
        let ctx = GradingCtx::new(1, &request.image_url);
        self.flow.run(request, &ctx).await.into()
    }

    /// 运行批量评分主逻辑
    pub async fn run(&self) -> Result<BatchReport> {
        logging::init_log_file(&self.config.output_log_file)?;
        logging::log_startup(
            self.config.max_concurrent_requests,
            match self.config.ocr_engine {
                OcrEngine::OcrSpace => "ocr_space",
                OcrEngine::Llm => "llm",
            },
        );

        // 加载所有待评分的作业
        let requests = self.load_submissions().await?;

        if requests.is_empty() {
            warn!("⚠️ 没有找到待评分的作业，程序结束");
            return Ok(BatchReport::default());
        }

        logging::log_submissions_loaded(requests.len(), self.config.max_concurrent_requests);

        let report = self.grade_all(requests).await?;

        logging::print_final_stats(
            report.success,
            report.failed,
            report.average_grade(),
            &self.config.results_file,
        );

        Ok(report)
    }

    /// 加载作业
    async fn load_submissions(&self) -> Result<Vec<GradeRequest>> {
        info!("📁 正在扫描待评分的作业...");
        let batches = load_all_submission_files(&self.config.submissions_folder).await?;
        Ok(batches
            .into_iter()
            .flat_map(|batch| batch.submissions)
            .collect())
    }

    /// 分批评分所有作业
    pub async fn grade_all(&self, requests: Vec<GradeRequest>) -> Result<BatchReport> {
        let batch_size = self.config.max_concurrent_requests.max(1);
        let semaphore = Arc::new(Semaphore::new(batch_size));
        let total = requests.len();
        let total_batches = total.div_ceil(batch_size);
        let mut report = BatchReport::default();

        for (batch_idx, batch) in requests.chunks(batch_size).enumerate() {
            let batch_start = batch_idx * batch_size;
            let batch_num = batch_idx + 1;

            logging::log_batch_start(
                batch_num,
                total_batches,
                batch_start + 1,
                batch_start + batch.len(),
                total,
            );

            let outcomes = self
                .grade_batch(batch, batch_start, semaphore.clone())
                .await?;

            let batch_success = outcomes.iter().filter(|(_, o)| o.is_graded()).count();
            logging::log_batch_complete(batch_num, batch_success, batch.len());

            for (request, outcome) in outcomes {
                report.push(request, outcome);
            }
        }

        Ok(report)
    }

    /// 评分单个批次
    async fn grade_batch(
        &self,
        batch: &[GradeRequest],
        batch_start: usize,
        semaphore: Arc<Semaphore>,
    ) -> Result<Vec<(GradeRequest, SubmissionOutcome)>> {
        let mut handles = Vec::new();

        // 为本批创建并发任务
        for (idx, request) in batch.iter().enumerate() {
            let ctx = GradingCtx::new(batch_start + idx + 1, &request.image_url);
            let permit = semaphore.clone().acquire_owned().await?;
            let flow = self.flow.clone();
            let request = request.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                flow.run(&request, &ctx).await
            });
            handles.push((batch[idx].clone(), handle));
        }

        // 等待本批所有任务完成
        let mut outcomes = Vec::with_capacity(handles.len());
        for (request, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => SubmissionOutcome::from(result),
                Err(e) => {
                    error!("[作业 {}] 任务执行失败: {}", request.image_url, e);
                    SubmissionOutcome::Failed(crate::models::ErrorBody {
                        message: "Internal server error".to_string(),
                        detail: e.to_string(),
                    })
                }
            };
            outcomes.push((request, outcome));
        }

        Ok(outcomes)
    }
}

/// 批量评分统计
#[derive(Debug, Default)]
pub struct BatchReport {
    pub success: usize,
    pub failed: usize,
    pub outcomes: Vec<(GradeRequest, SubmissionOutcome)>,
    grade_sum: u64,
}

impl BatchReport {
    fn push(&mut self, request: GradeRequest, outcome: SubmissionOutcome) {
        match &outcome {
            SubmissionOutcome::Graded(response) => {
                self.success += 1;
                self.grade_sum += u64::from(response.grade);
            }
            SubmissionOutcome::Failed(_) => self.failed += 1,
        }
        self.outcomes.push((request, outcome));
    }

    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    /// 成功作业的平均分，没有成功作业时为 0
    pub fn average_grade(&self) -> f64 {
        if self.success == 0 {
            0.0
        } else {
            self.grade_sum as f64 / self.success as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::{ModelReply, ScoringPolicy};
    use crate::models::GradeRecord;
    use crate::services::{MultimodalGrader, ResultStore};
    use async_trait::async_trait;

    /// 把图片地址本身当作识别结果
    struct EchoRecognizer;

    #[async_trait]
    impl TextRecognizer for EchoRecognizer {
        fn name(&self) -> &str {
            "echo"
        }

        async fn recognize(&self, image_url: &str) -> anyhow::Result<String> {
            Ok(image_url.to_string())
        }
    }

    struct FixedModel;

    #[async_trait]
    impl MultimodalGrader for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn grade_image(&self, _image_url: &str) -> anyhow::Result<ModelReply> {
            Ok(ModelReply::Text("评分：70 还不错".to_string()))
        }
    }

    struct NullStore;

    #[async_trait]
    impl ResultStore for NullStore {
        fn target(&self) -> &str {
            "null"
        }

        async fn save(&self, _record: &GradeRecord) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn test_app(max_concurrent: usize) -> App {
        let config = Config {
            max_concurrent_requests: max_concurrent,
            ..Config::default()
        };
        let flow = GradingFlow::new(
            Arc::new(EchoRecognizer),
            Arc::new(FixedModel),
            Arc::new(NullStore),
            ScoringPolicy::default(),
        );
        App::with_flow(config, flow)
    }

    #[tokio::test]
    async fn test_grade_all_keeps_order_and_counts() {
        let app = test_app(2);
        let requests = vec![
            GradeRequest::new("2+2=4"),
            GradeRequest::new("2+2=5"),
            GradeRequest::new("   "),
            GradeRequest::new("any").with_model(true),
            GradeRequest::new("3*3"),
        ];

        let report = app.grade_all(requests).await.unwrap();

        assert_eq!(report.total(), 5);
        assert_eq!(report.success, 4);
        assert_eq!(report.failed, 1);

        let urls: Vec<&str> = report
            .outcomes
            .iter()
            .map(|(r, _)| r.image_url.as_str())
            .collect();
        assert_eq!(urls, vec!["2+2=4", "2+2=5", "   ", "any", "3*3"]);

        // 100 + 0 + 70 + 50
        assert!((report.average_grade() - 55.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_grade_one_failure_body() {
        let app = test_app(1);
        match app.grade_one(&GradeRequest::new("")).await {
            SubmissionOutcome::Failed(body) => {
                assert_eq!(body.message, "Internal server error");
                assert_eq!(body.status(), 500);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_report() {
        let app = test_app(4);
        let report = app.grade_all(Vec::new()).await.unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(report.average_grade(), 0.0);
    }
}
