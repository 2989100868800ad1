use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// 生成管线的错误分类
#[derive(Debug)]
pub enum GenerationError {
    /// 未配置上游API密钥
    MissingApiKey,
    /// 请求未到达上游或响应体无法读取
    Network(String),
    /// 上游返回非2xx
    Upstream { status: u16, body: String },
    /// 上游响应中没有补全内容
    EmptyResponse,
    /// 响应不是合法JSON
    MalformedResponse,
    /// JSON结构缺少questions数组
    InvalidStructure,
    /// 过滤后没有任何有效题目
    NoValidQuestions,
}

/// 失败响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

impl GenerationError {
    /// 映射为HTTP状态码和对外错误消息
    pub fn to_parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            GenerationError::MissingApiKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Quiz generation service is not configured"),
            ),
            GenerationError::Network(details) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::with_details(
                    "Quiz generation service is temporarily unavailable",
                    details.clone(),
                ),
            ),
            GenerationError::Upstream { status, .. } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::with_details(
                    "Quiz generation service is temporarily unavailable",
                    format!("upstream returned status {}", status),
                ),
            ),
            GenerationError::EmptyResponse => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::with_details(
                    "Quiz generation service is temporarily unavailable",
                    "upstream returned no completion content",
                ),
            ),
            GenerationError::MalformedResponse => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::with_details(
                    "Failed to process the generated response",
                    "response was not valid JSON",
                ),
            ),
            GenerationError::InvalidStructure => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::with_details(
                    "Failed to process the generated response",
                    "response did not contain a questions array",
                ),
            ),
            GenerationError::NoValidQuestions => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::with_details(
                    "Failed to process the generated response",
                    "no valid questions in response",
                ),
            ),
        }
    }
}
