//! OCR 服务 - 业务能力层
//!
//! 只负责"识别图片文字"能力，调用 OCR.space 兼容的 HTTP 接口

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::services::providers::TextRecognizer;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    /// 可能是字符串，也可能是字符串数组
    #[serde(default)]
    error_message: JsonValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrResponse {
    fn error_text(&self) -> String {
        match &self.error_message {
            JsonValue::String(s) => s.clone(),
            JsonValue::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "未知错误".to_string(),
        }
    }

    /// 多页结果按顺序用换行拼接
    fn into_text(self) -> String {
        self.parsed_results
            .into_iter()
            .map(|r| r.parsed_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// OCR 服务
///
/// 职责：
/// - 调用 OCR 接口识别图片文字
/// - 不关心识别结果如何评分
pub struct OcrService {
    client: Client,
    api_base_url: String,
    api_key: String,
    language: String,
}

impl OcrService {
    /// 创建新的 OCR 服务
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            client,
            api_base_url: config.ocr_api_base_url.clone(),
            api_key: config.ocr_api_key.clone(),
            language: config.ocr_language.clone(),
        })
    }

    /// 解析 OCR 接口返回的 JSON
    fn parse_response(body: &str) -> Result<String> {
        let response: OcrResponse =
            serde_json::from_str(body).context("无法解析 OCR 接口返回的 JSON")?;

        if response.is_errored_on_processing {
            anyhow::bail!("OCR 处理失败: {}", response.error_text());
        }

        Ok(response.into_text())
    }
}

#[async_trait]
impl TextRecognizer for OcrService {
    fn name(&self) -> &str {
        "ocr_space"
    }

    async fn recognize(&self, image_url: &str) -> Result<String> {
        debug!("调用 OCR 接口: {}", self.api_base_url);

        let params = [
            ("apikey", self.api_key.as_str()),
            ("url", image_url),
            ("language", self.language.as_str()),
            ("scale", "true"),
        ];

        let response = self
            .client
            .post(&self.api_base_url)
            .form(&params)
            .send()
            .await
            .context("OCR 接口请求失败")?;

        let status = response.status();
        let body = response.text().await.context("读取 OCR 响应失败")?;

        if !status.is_success() {
            warn!("OCR 接口返回 HTTP {}", status);
            anyhow::bail!("OCR 接口返回 HTTP {}: {}", status, body);
        }

        let text = Self::parse_response(&body)?;
        debug!("OCR 识别完成: {} 字符", text.chars().count());
        Ok(text)
    }
}
