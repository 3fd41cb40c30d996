use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;
use crate::grading::{Locale, ScoringPolicy, UnparsablePolicy};

/// 文字识别方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrEngine {
    /// OCR.space 兼容的 HTTP 接口
    OcrSpace,
    /// 让视觉大模型转写
    Llm,
}

impl FromStr for OcrEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ocr_space" | "ocrspace" | "ocr" => Ok(OcrEngine::OcrSpace),
            "llm" | "vision" => Ok(OcrEngine::Llm),
            other => Err(format!("未知的识别方式: {}", other)),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时评分的作业数量
    pub max_concurrent_requests: usize,
    /// 待评分作业（TOML）存放目录
    pub submissions_folder: String,
    /// 评分结果保存文件（JSON Lines）
    pub results_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 外部请求超时（秒）
    pub http_timeout_secs: u64,
    // --- OCR 配置 ---
    pub ocr_engine: OcrEngine,
    pub ocr_api_base_url: String,
    pub ocr_api_key: String,
    pub ocr_language: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 是否先下载图片再以 base64 发给模型
    pub llm_inline_images: bool,
    // --- 评分配置 ---
    pub grading_locale: Locale,
    /// 无法解析的行是否计入平均分
    pub grading_count_unparsable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 8,
            submissions_folder: "submissions".to_string(),
            results_file: "grades.jsonl".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            http_timeout_secs: 30,
            ocr_engine: OcrEngine::OcrSpace,
            ocr_api_base_url: "https://api.ocr.space/parse/image".to_string(),
            ocr_api_key: String::new(),
            ocr_language: "chs".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            llm_inline_images: true,
            grading_locale: Locale::Zh,
            grading_count_unparsable: false,
        }
    }
}

/// 读取并解析环境变量，不存在时返回 `None`
fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// 从环境变量加载配置，格式错误时返回错误
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        let config = Self {
            max_concurrent_requests: env_parse("MAX_CONCURRENT_REQUESTS", "usize")?
                .unwrap_or(default.max_concurrent_requests),
            submissions_folder: std::env::var("SUBMISSIONS_FOLDER")
                .unwrap_or(default.submissions_folder),
            results_file: std::env::var("RESULTS_FILE").unwrap_or(default.results_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", "u64")?
                .unwrap_or(default.http_timeout_secs),
            ocr_engine: env_parse("OCR_ENGINE", "ocr_space | llm")?.unwrap_or(default.ocr_engine),
            ocr_api_base_url: std::env::var("OCR_API_BASE_URL")
                .unwrap_or(default.ocr_api_base_url),
            ocr_api_key: std::env::var("OCR_API_KEY").unwrap_or(default.ocr_api_key),
            ocr_language: std::env::var("OCR_LANGUAGE").unwrap_or(default.ocr_language),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL")
                .unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_inline_images: env_parse("LLM_INLINE_IMAGES", "bool")?
                .unwrap_or(default.llm_inline_images),
            grading_locale: env_parse("GRADING_LOCALE", "zh | en")?
                .unwrap_or(default.grading_locale),
            grading_count_unparsable: env_parse("GRADING_COUNT_UNPARSABLE", "bool")?
                .unwrap_or(default.grading_count_unparsable),
        };

        if config.max_concurrent_requests == 0 {
            return Err(ConfigError::EnvVarParseFailed {
                var_name: "MAX_CONCURRENT_REQUESTS".to_string(),
                value: "0".to_string(),
                expected_type: "正整数".to_string(),
            });
        }

        Ok(config)
    }

    /// 从环境变量加载配置，格式错误时记录警告并使用默认值
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            warn!("{}，使用默认配置", e);
            Self::default()
        })
    }

    /// 评分策略
    pub fn scoring_policy(&self) -> ScoringPolicy {
        let unparsable = if self.grading_count_unparsable {
            UnparsablePolicy::Include
        } else {
            UnparsablePolicy::Exclude
        };
        ScoringPolicy::new(unparsable, self.grading_locale)
    }

    /// 检查调用外部服务所需的密钥
    pub fn require_llm_key(&self) -> Result<&str, ConfigError> {
        if self.llm_api_key.is_empty() {
            return Err(ConfigError::Missing {
                var_name: "LLM_API_KEY".to_string(),
            });
        }
        Ok(&self.llm_api_key)
    }
}
