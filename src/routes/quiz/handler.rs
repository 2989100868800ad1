use axum::{
    Json,
    extract::{Extension, State},
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    error::ErrorResponse,
    middleware::RateLimitStatus,
    utils::Claims,
};

use super::model::{GenerateQuizRequest, GenerateQuizResponse};

fn rate_limit_headers(status: &RateLimitStatus) -> [(HeaderName, String); 2] {
    [
        (
            HeaderName::from_static("x-ratelimit-remaining"),
            status.remaining.to_string(),
        ),
        (
            HeaderName::from_static("x-ratelimit-reset"),
            status.reset_at.to_string(),
        ),
    ]
}

/// 出题入口：预检 → 限流检查 → 生成 → 计入额度
#[axum::debug_handler]
pub async fn generate_quiz(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<GenerateQuizRequest>,
) -> Response {
    // 输入预检，不通过就不碰限流和上游
    if req.text.trim().chars().count() < state.config.min_text_length {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Text is too short for quiz generation",
            )),
        )
            .into_response();
    }

    if req.topic.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Topic is required to generate focused quiz questions",
            )),
        )
            .into_response();
    }

    if req.number_of_questions == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("numberOfQuestions must be at least 1")),
        )
            .into_response();
    }

    let identity = claims.sub.as_str();
    let rate_status = state.limiter.check(identity).await;
    let headers = rate_limit_headers(&rate_status);

    if !rate_status.allowed {
        let reset_time = chrono::DateTime::from_timestamp(rate_status.reset_at, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| rate_status.reset_at.to_string());
        return (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            Json(ErrorResponse::with_details(
                "Daily quiz generation limit reached",
                format!("limit resets at {}", reset_time),
            )),
        )
            .into_response();
    }

    match state
        .generator
        .generate(&req.text, &req.topic, req.number_of_questions)
        .await
    {
        Ok(questions) => {
            // 只有生成成功才计入额度，失败的调用不消耗
            state.limiter.increment(identity).await;

            let total_generated = questions.len();
            tracing::info!(
                "Generated {} question(s) for identity {}",
                total_generated,
                identity
            );

            (
                StatusCode::OK,
                headers,
                Json(GenerateQuizResponse {
                    questions,
                    total_generated,
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Quiz generation failed for identity {}: {:?}", identity, e);
            let (status_code, body) = e.to_parts();
            (status_code, headers, Json(body)).into_response()
        }
    }
}
