use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub groq_api_url: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub min_text_length: usize,
    pub redis_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            jwt_secret: env::var("JWT_SECRET")?,
            groq_api_url: env::var("GROQ_API_URL").unwrap_or_else(|_| {
                "https://api.groq.com/openai/v1/chat/completions".to_string()
            }),
            // 未配置密钥时允许启动，调用时返回配置错误
            groq_api_key: env::var("GROQ_API_KEY").ok(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.1-8b-instant".to_string()),
            rate_limit_window_secs: env::var("RATE_LIMIT_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(86400),
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            min_text_length: env::var("MIN_TEXT_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            redis_url: env::var("REDIS_URL").ok(),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}
