use config::Config;
use generation::GenerationService;
use middleware::RateLimiter;

pub mod cache;
pub mod config;
pub mod error;
pub mod generation;
pub mod middleware;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: GenerationService,
    pub limiter: RateLimiter,
}
