use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use quizgen_backend::{
    AppState,
    cache::{MemoryRateLimitStore, RateLimitStore, RedisRateLimitStore},
    config::Config,
    generation::GenerationService,
    middleware::{RateLimiter, auth_middleware, log_errors},
    routes,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    if config.groq_api_key.is_none() {
        tracing::warn!("GROQ_API_KEY is not set; generation requests will fail until configured");
    }

    // 选择限流存储后端
    let store: Arc<dyn RateLimitStore> = match &config.redis_url {
        Some(url) => {
            let client =
                redis::Client::open(url.as_str()).expect("Failed to create Redis client");
            tracing::info!("Using Redis rate limit store");
            Arc::new(RedisRateLimitStore::new(client))
        }
        None => {
            tracing::info!("Using in-memory rate limit store");
            Arc::new(MemoryRateLimitStore::new())
        }
    };

    let limiter = RateLimiter::new(store, &config);
    let generator = GenerationService::new(reqwest::Client::new(), &config);

    let state = AppState {
        config: config.clone(),
        generator,
        limiter,
    };

    // 将路由分为公开路由和受保护路由
    let public_routes = Router::new().route("/health", get(|| async { "ok" }));

    let protected_routes = Router::new()
        .route("/quiz/generate", post(routes::quiz::handler::generate_quiz))
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        use tower_http::cors::CorsLayer;
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
