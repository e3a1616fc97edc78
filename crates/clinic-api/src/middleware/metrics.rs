//! HTTP 요청 metrics middleware.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 요청 수, 응답 상태, 처리 시간을 기록하는 미들웨어.
///
/// 경로는 [`normalize_path`]로 정규화되어 환자 id가 라벨 카디널리티를
/// 늘리지 않습니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    #[tokio::test]
    async fn test_metrics_layer_passes_response_through() {
        let app = Router::new()
            .route("/patients/{id}", get(ok_handler))
            .layer(middleware::from_fn(metrics_layer));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/patients/42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
