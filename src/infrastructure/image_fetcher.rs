//! 图片下载器 - 基础设施层
//!
//! 持有 HTTP 客户端，只暴露"下载图片"的能力

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// 下载下来的图片
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl FetchedImage {
    /// 转成 `data:<mime>;base64,...` 形式，供视觉模型直接读取
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// 根据扩展名猜测图片类型，猜不出时按 jpeg 处理
pub fn guess_mime_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    match path.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}

/// 图片下载器
///
/// 职责：
/// - 持有唯一的 HTTP 客户端
/// - 不认识评分请求 / 评分结果
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("无法创建 HTTP 客户端")?;
        Ok(Self { client })
    }

    /// 下载图片
    pub async fn fetch(&self, image_url: &str) -> Result<FetchedImage> {
        debug!("正在下载图片: {}", image_url);

        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .with_context(|| format!("图片下载失败: {}", image_url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("图片下载失败 ({}): HTTP {}", image_url, status);
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| guess_mime_type(image_url).to_string());

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("读取图片内容失败: {}", image_url))?
            .to_vec();

        debug!("图片下载完成: {} 字节, 类型 {}", bytes.len(), mime_type);

        Ok(FetchedImage { bytes, mime_type })
    }
}
