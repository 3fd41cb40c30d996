use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 评分请求级别的错误
///
/// 表达式求值错误不在此列：它在评分核心内部通过数字兜底消化掉，从不外抛
#[derive(Debug, Error)]
pub enum GradeError {
    /// 图片中没有识别到文字
    #[error("图片中未检测到文字")]
    NoTextDetected,

    /// 外部服务（OCR / 大模型 / 图片下载）调用失败
    #[error("{provider} 调用失败: {source}")]
    Provider {
        provider: String,
        #[source]
        source: BoxError,
    },

    /// 评分已完成，但结果保存失败
    #[error("评分结果保存失败 ({target}): {source}")]
    Persistence {
        target: String,
        #[source]
        source: BoxError,
    },

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必需的配置缺失
    #[error("缺少配置项 {var_name}")]
    Missing { var_name: String },
}

// ========== 便捷构造函数 ==========

impl GradeError {
    /// 创建外部服务调用错误
    pub fn provider(provider: impl Into<String>, source: impl Into<BoxError>) -> Self {
        GradeError::Provider {
            provider: provider.into(),
            source: source.into(),
        }
    }

    /// 创建结果保存错误
    pub fn persistence(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        GradeError::Persistence {
            target: target.into(),
            source: source.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 评分结果类型
pub type AppResult<T> = Result<T, GradeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_provider_error_keeps_source() {
        let err = GradeError::provider("ocr", anyhow::anyhow!("连接超时"));
        assert_eq!(err.to_string(), "ocr 调用失败: 连接超时");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: GradeError = ConfigError::Missing {
            var_name: "LLM_API_KEY".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "缺少配置项 LLM_API_KEY");
    }
}
