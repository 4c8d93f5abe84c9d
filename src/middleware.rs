use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use tracing::{debug, instrument, warn};

use crate::error::AppError;

/// Parsed JSON request body, available to handlers as an extension.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub serde_json::Value);

fn is_json(headers: &HeaderMap) -> bool {
    let Some(ct) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn is_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if e.is::<LengthLimitError>() {
            return true;
        }
        cur = e.source();
    }
    false
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Buffers and parses JSON bodies up to `limit` bytes, then forwards the
/// request with the same bytes and a [`JsonBody`] extension attached.
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn parse_json_body(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !is_json(request.headers()) {
        return Ok(next.run(request).await);
    }
    if declared_length(request.headers()).is_some_and(|len| len > limit) {
        warn!(limit, "json body exceeds limit");
        return Err(AppError::PayloadTooLarge);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit(&e) {
            warn!(limit, "json body exceeds limit");
            AppError::PayloadTooLarge
        } else {
            warn!(error = %e, "failed to read json body");
            AppError::BadRequest(format!("Failed to read request body: {e}"))
        }
    })?;

    if !bytes.is_empty() {
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
        debug!(len = bytes.len(), "json body parsed");
        parts.extensions.insert(JsonBody(value));
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{Request as HttpRequest, StatusCode},
        routing::post,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn app(limit: usize) -> Router {
        Router::new()
            .route(
                "/echo",
                post(|body: Option<Extension<JsonBody>>| async move {
                    match body {
                        Some(Extension(JsonBody(v))) => v.to_string(),
                        None => "none".to_string(),
                    }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(limit, parse_json_body))
    }

    async fn send(app: Router, content_type: &str, body: &'static str) -> (StatusCode, String) {
        let res = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/echo")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn json_body_is_parsed_into_extension() {
        let (status, body) = send(app(1024), "application/json; charset=utf-8", r#"{"a":1}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn vendor_json_types_are_parsed() {
        let (status, body) = send(app(1024), "application/vnd.api+json", "[1,2]").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[1,2]");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let (status, body) = send(app(1024), "application/json", "{nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid JSON body"));
    }

    #[tokio::test]
    async fn oversized_json_is_rejected() {
        let (status, _) = send(app(4), "application/json", r#"{"a":"long"}"#).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn oversized_json_with_declared_length_is_rejected() {
        let res = app(4)
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/echo")
                    .header("content-type", "application/json")
                    .header("content-length", "12")
                    .body(Body::from(r#"{"a":"long"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn broken_body_stream_is_a_bad_request() {
        let chunks = futures::stream::iter(vec![
            Ok::<Vec<u8>, std::io::Error>(b"{\"a\":".to_vec()),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
        ]);
        let res = app(1024)
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from_stream(chunks))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Failed to read request body"));
    }

    #[tokio::test]
    async fn non_json_requests_pass_through() {
        let (status, body) = send(app(4), "text/plain", "{not json at all").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "none");
    }

    #[tokio::test]
    async fn empty_json_body_passes_without_extension() {
        let (status, body) = send(app(1024), "application/json", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "none");
    }
}
