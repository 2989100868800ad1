use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
    routing::post,
};
use quizgen_backend::{
    AppState,
    cache::MemoryRateLimitStore,
    config::Config,
    generation::GenerationService,
    middleware::{RateLimiter, auth_middleware},
    routes,
    utils::generate_token,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn test_config(api_url: String) -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        jwt_secret: "integration-secret".to_string(),
        groq_api_url: api_url,
        groq_api_key: Some("test-key".to_string()),
        groq_model: "llama-3.1-8b-instant".to_string(),
        rate_limit_window_secs: 86400,
        rate_limit_requests: 3,
        min_text_length: 100,
        redis_url: None,
    }
}

fn test_app(config: Config) -> Router {
    let store = Arc::new(MemoryRateLimitStore::new());
    let limiter = RateLimiter::new(store, &config);
    let generator = GenerationService::new(reqwest::Client::new(), &config);

    let state = AppState {
        config: config.clone(),
        generator,
        limiter,
    };

    Router::new()
        .route("/quiz/generate", post(routes::quiz::handler::generate_quiz))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn source_text() -> String {
    "Photosynthesis is the process by which green plants convert light energy into chemical \
     energy stored in glucose. Chlorophyll pigments inside chloroplasts absorb light mostly \
     in the blue and red wavelengths. The light-dependent reactions split water molecules \
     and release oxygen as a byproduct. The Calvin cycle then fixes carbon dioxide into \
     organic molecules usable by the plant."
        .to_string()
}

fn quiz_questions(count: usize) -> Value {
    let questions: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "question": format!("What does stage {} of photosynthesis produce?", i),
                "options": ["Glucose", "Oxygen", "Water", "Nitrogen"],
                "correctAnswer": i % 4,
                "explanation": "Derived from the light-dependent reactions described in the text."
            })
        })
        .collect();
    json!(questions)
}

fn completion_body(questions: Value) -> Value {
    json!({
        "choices": [
            { "message": { "content": json!({ "questions": questions }).to_string() } }
        ]
    })
}

fn quiz_request(token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/quiz/generate")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

fn header_str<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

async fn upstream_with(body: Value, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

fn api_url(server: &MockServer) -> String {
    format!("{}/v1/chat/completions", server.uri())
}

#[tokio::test]
async fn short_text_is_rejected_without_contacting_upstream() {
    let server = upstream_with(completion_body(quiz_questions(5)), 0).await;
    let config = test_config(api_url(&server));
    let (token, _) = generate_token("user-short", &config).expect("token mints");
    let app = test_app(config);

    let response = app
        .oneshot(quiz_request(
            &token,
            json!({ "text": "Only fifty characters of text, give or take.", "topic": "Biology", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().is_some_and(|e| e.contains("too short")));
}

#[tokio::test]
async fn missing_bearer_token_is_rejected_before_rate_limiting() {
    let server = upstream_with(completion_body(quiz_questions(5)), 0).await;
    let config = test_config(api_url(&server));
    let app = test_app(config);

    let request = Request::builder()
        .method("POST")
        .uri("/quiz/generate")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "text": source_text(), "topic": "Photosynthesis" }).to_string(),
        ))
        .expect("request builds");

    let response = app.oneshot(request).await.expect("request completes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() {
    let server = upstream_with(completion_body(quiz_questions(5)), 0).await;
    let config = test_config(api_url(&server));
    let app = test_app(config);

    let response = app
        .oneshot(quiz_request(
            "not-a-jwt",
            json!({ "text": source_text(), "topic": "Photosynthesis" }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn successful_generation_returns_requested_questions_and_charges_quota() {
    let server = upstream_with(completion_body(quiz_questions(5)), 1).await;
    let config = test_config(api_url(&server));
    let (token, _) = generate_token("user-success", &config).expect("token mints");
    let app = test_app(config);

    let response = app
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("2"));
    assert!(header_str(&response, "x-ratelimit-reset").is_some());

    let body = response_json(response).await;
    assert_eq!(body["totalGenerated"], 5);
    let questions = body["questions"].as_array().expect("questions array");
    assert_eq!(questions.len(), 5);
    for q in questions {
        assert_eq!(q["options"].as_array().map(Vec::len), Some(4));
        let answer = q["correctAnswer"].as_i64().expect("integer answer");
        assert!((0..4).contains(&answer));
    }
}

#[tokio::test]
async fn partial_validity_returns_fewer_questions_but_still_charges_quota() {
    // 5道里只有2道通过结构校验
    let mut questions = quiz_questions(2).as_array().cloned().unwrap_or_default();
    questions.push(json!({ "question": "no options", "correctAnswer": 0, "explanation": "x" }));
    questions.push(json!({ "question": "bad answer", "options": ["a", "b", "c", "d"], "correctAnswer": 9, "explanation": "x" }));
    questions.push(json!({ "question": "", "options": ["a", "b", "c", "d"], "correctAnswer": 0, "explanation": "x" }));

    let server = upstream_with(completion_body(json!(questions)), 1).await;
    let config = test_config(api_url(&server));
    let (token, _) = generate_token("user-partial", &config).expect("token mints");
    let app = test_app(config.clone());

    let response = app
        .clone()
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["totalGenerated"], 2);
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(2));

    // 额度已消耗：下一次请求的剩余额度应为1
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(quiz_questions(5))))
        .mount(&server)
        .await;

    let response = app
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("1"));
}

#[tokio::test]
async fn fourth_request_in_window_is_rate_limited_without_contacting_upstream() {
    let server = upstream_with(completion_body(quiz_questions(3)), 3).await;
    let config = test_config(api_url(&server));
    let (token, _) = generate_token("user-limited", &config).expect("token mints");
    let app = test_app(config);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(quiz_request(
                &token,
                json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 3 }),
            ))
            .await
            .expect("request completes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 3 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("0"));
    assert!(header_str(&response, "x-ratelimit-reset").is_some());

    let body = response_json(response).await;
    assert!(body["error"].as_str().is_some_and(|e| e.contains("limit")));
    assert!(body["details"].as_str().is_some_and(|d| d.contains("resets at")));
}

#[tokio::test]
async fn upstream_failure_surfaces_error_and_does_not_consume_quota() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(api_url(&server));
    let (token, _) = generate_token("user-upstream", &config).expect("token mints");
    let app = test_app(config);

    let response = app
        .clone()
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response_json(response).await;
    assert!(body["error"].as_str().is_some_and(|e| e.contains("unavailable")));
    assert!(body["details"].as_str().is_some_and(|d| d.contains("503")));

    // 失败不消耗额度：恢复后的请求仍看到完整窗口
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(quiz_questions(5))))
        .mount(&server)
        .await;

    let response = app
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("2"));
}

#[tokio::test]
async fn unparseable_completion_does_not_consume_quota() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": "this is not json at all" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(api_url(&server));
    let (token, _) = generate_token("user-malformed", &config).expect("token mints");
    let app = test_app(config);

    let response = app
        .clone()
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response_json(response).await;
    assert!(body["error"].as_str().is_some_and(|e| e.contains("process")));

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(quiz_questions(5))))
        .mount(&server)
        .await;

    let response = app
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(header_str(&response, "x-ratelimit-remaining"), Some("2"));
}

#[tokio::test]
async fn missing_api_key_is_reported_as_configuration_failure() {
    let server = upstream_with(completion_body(quiz_questions(5)), 0).await;
    let mut config = test_config(api_url(&server));
    config.groq_api_key = None;
    let (token, _) = generate_token("user-config", &config).expect("token mints");
    let app = test_app(config);

    let response = app
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "Photosynthesis", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(body["error"].as_str().is_some_and(|e| e.contains("not configured")));
}

#[tokio::test]
async fn missing_topic_is_rejected_before_generation() {
    let server = upstream_with(completion_body(quiz_questions(5)), 0).await;
    let config = test_config(api_url(&server));
    let (token, _) = generate_token("user-topic", &config).expect("token mints");
    let app = test_app(config);

    let response = app
        .oneshot(quiz_request(
            &token,
            json!({ "text": source_text(), "topic": "   ", "numberOfQuestions": 5 }),
        ))
        .await
        .expect("request completes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().is_some_and(|e| e.contains("Topic")));
}
