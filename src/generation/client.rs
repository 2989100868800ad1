use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::{Prompts, SamplingParams};
use crate::{config::Config, error::GenerationError};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    stream: bool,
    presence_penalty: f64,
    frequency_penalty: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// 上游补全API客户端，单次请求，不重试，不覆盖传输层默认超时
#[derive(Clone)]
pub struct CompletionClient {
    http: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl CompletionClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            api_url: config.groq_api_url.clone(),
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
        }
    }

    /// 发起一次补全调用，返回模型输出的原始文本
    pub async fn complete(
        &self,
        prompts: &Prompts,
        params: &SamplingParams,
    ) -> Result<String, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::MissingApiKey);
        };

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompts.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompts.user,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            stream: false,
            presence_penalty: params.presence_penalty,
            frequency_penalty: params.frequency_penalty,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request failed to send: {}", e);
                GenerationError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "Completion API returned status {}: {}",
                status,
                body
            );
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let data: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to decode completion response: {}", e);
            GenerationError::Network(e.to_string())
        })?;

        data.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}
