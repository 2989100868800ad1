use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

/// 记录错误响应：5xx连同响应体打日志，4xx只记状态
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let status = response.status();

    if status.is_server_error() {
        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, 2048).await {
            Ok(b) => b,
            Err(e) => {
                error!("Failed to buffer error response body: {}", e);
                return Response::from_parts(parts, Body::empty());
            }
        };

        error!(
            "{} {} failed with {}: {}",
            method,
            uri,
            status,
            String::from_utf8_lossy(&bytes)
        );

        // body已被读走，重建响应前去掉旧的长度头
        parts.headers.remove(axum::http::header::CONTENT_LENGTH);
        Response::from_parts(parts, Body::from(bytes))
    } else {
        if status.is_client_error() {
            debug!("{} {} rejected with {}", method, uri, status);
        }
        response
    }
}
