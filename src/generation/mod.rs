pub mod client;
pub mod prompt;
pub mod selector;
pub mod validator;

pub use client::CompletionClient;

use crate::{config::Config, error::GenerationError, routes::quiz::model::QuizQuestion};

/// 出题管线：内容筛选 → 提示词组装 → 上游调用 → 响应校验
#[derive(Clone)]
pub struct GenerationService {
    client: CompletionClient,
}

impl GenerationService {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            client: CompletionClient::new(http, config),
        }
    }

    pub async fn generate(
        &self,
        text: &str,
        topic: &str,
        count: usize,
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        let excerpt = selector::extract_important_content(text, topic);

        // rng不能跨await持有
        let (prompts, params) = {
            let mut rng = rand::thread_rng();
            let content = selector::randomized_content_sections(&excerpt, &mut rng);
            (
                prompt::build_prompts(&content, topic, count),
                prompt::sampling_params(&mut rng),
            )
        };

        let raw = self.client.complete(&prompts, &params).await?;

        validator::validate_questions(&raw, count)
    }
}
