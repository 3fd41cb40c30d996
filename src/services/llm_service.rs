//! LLM 服务 - 业务能力层
//!
//! 只负责"看图"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::grading::ModelReply;
use crate::infrastructure::ImageFetcher;
use crate::services::providers::{MultimodalGrader, TextRecognizer};

const GRADING_SYSTEM_PROMPT: &str = "You are a Math Teacher. Respond with concise comment.";

const GRADING_USER_PROMPT: &str = "请分析这张数学作业图片,给出评分(满分100分)和详细评语。\
评语应该指出作业的优点和需要改进的地方。请在回复中用\"评分：分数\"的格式写出分数。";

const TRANSCRIBE_SYSTEM_PROMPT: &str = "你是一个精确的文字识别助手，只输出图片中的原文。";

const TRANSCRIBE_USER_PROMPT: &str = "请逐行转写图片中的所有数学算式，每行一个，\
保持原样（包括写错的答案），不要计算、不要解释。如果图片中没有文字，什么都不要输出。";

/// 把模型返回的消息转成 [`ModelReply`]
fn reply_from_message(content: Option<String>, refusal: Option<String>) -> ModelReply {
    match (content, refusal) {
        (Some(text), _) if !text.trim().is_empty() => ModelReply::Text(text.trim().to_string()),
        (_, Some(reason)) => ModelReply::Refusal(reason),
        _ => ModelReply::Empty,
    }
}

/// LLM 服务
///
/// 职责：
/// - 调用视觉模型直接给作业评分（备用评分分支）
/// - 也可作为文字识别服务，把图片转写成算式文本
/// - 不出现评分规则
/// - 不关心流程顺序
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    /// 为 `None` 时直接把图片 URL 交给模型
    image_fetcher: Option<ImageFetcher>,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config, image_fetcher: ImageFetcher) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            image_fetcher: config.llm_inline_images.then_some(image_fetcher),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 把图片地址转成模型可读取的形式
    async fn resolve_image(&self, image_url: &str) -> Result<String> {
        match &self.image_fetcher {
            Some(fetcher) => Ok(fetcher.fetch(image_url).await?.to_data_url()),
            None => Ok(image_url.to_string()),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `imgs`: 图片 URL 列表（可选），会追加到用户消息中
    ///
    /// # 返回
    /// 返回模型回复
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        imgs: Option<&[String]>,
    ) -> Result<ModelReply> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = match imgs {
            Some(img_urls) if !img_urls.is_empty() => {
                let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> =
                    vec![ChatCompletionRequestUserMessageContentPart::Text(
                        ChatCompletionRequestMessageContentPartText {
                            text: user_message.to_string(),
                        },
                    )];

                for url in img_urls {
                    content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImage {
                            image_url: ImageUrl {
                                url: self.resolve_image(url).await?,
                                detail: Some(ImageDetail::High),
                            },
                        },
                    ));
                }

                debug!("使用 Vision API，包含 {} 张图片", img_urls.len());

                ChatCompletionRequestUserMessageArgs::default()
                    .content(ChatCompletionRequestUserMessageContent::Array(
                        content_parts,
                    ))
                    .build()?
            }
            _ => ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()?,
        };

        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(1024u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let reply = match response.choices.into_iter().next() {
            Some(choice) => reply_from_message(choice.message.content, choice.message.refusal),
            None => ModelReply::Empty,
        };

        Ok(reply)
    }
}

#[async_trait]
impl MultimodalGrader for LlmService {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn grade_image(&self, image_url: &str) -> Result<ModelReply> {
        let imgs = [image_url.to_string()];
        self.send_to_llm(GRADING_USER_PROMPT, Some(GRADING_SYSTEM_PROMPT), Some(&imgs))
            .await
    }
}

#[async_trait]
impl TextRecognizer for LlmService {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn recognize(&self, image_url: &str) -> Result<String> {
        let imgs = [image_url.to_string()];
        let reply = self
            .send_to_llm(
                TRANSCRIBE_USER_PROMPT,
                Some(TRANSCRIBE_SYSTEM_PROMPT),
                Some(&imgs),
            )
            .await?;

        match reply {
            ModelReply::Text(text) => Ok(text),
            ModelReply::Refusal(reason) => {
                warn!("模型拒绝转写图片: {}", reason);
                Ok(String::new())
            }
            ModelReply::Empty => Ok(String::new()),
        }
    }
}
