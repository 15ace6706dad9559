use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::state::AppState;

pub static X_TRACE_ID: &str = "x-trace-id";

/// JSON bodies below this size are logged at debug level.
const MAX_LOGGED_BODY: usize = 1024;

/// Wrap each request in an `http_request` span keyed by a trace id, log its
/// outcome and latency, and echo the trace id back in `x-trace-id`.
pub async fn trace_middleware(
    State(_state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();

    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %method,
        path = %path,
    );

    async move {
        info!("request started");
        let trace_header = HeaderValue::from_str(&trace_id.to_string()).ok();

        let (parts, body) = req.into_parts();
        let body = buffer_and_log("request", &parts.headers, body).await;
        let mut req = Request::from_parts(parts, body);
        if let Some(value) = &trace_header {
            req.headers_mut().insert(X_TRACE_ID, value.clone());
        }

        let response = next.run(req).await;

        let (parts, body) = response.into_parts();
        let body = buffer_and_log("response", &parts.headers, body).await;
        let mut response = Response::from_parts(parts, body);
        if let Some(value) = trace_header {
            response.headers_mut().insert(X_TRACE_ID, value);
        }

        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "response finished"
        );
        response
    }
    .instrument(span)
    .await
}

/// Log a small JSON body and hand back an equivalent body. Anything that is
/// not JSON, or whose size is unknown or above [`MAX_LOGGED_BODY`], passes
/// through without being buffered.
async fn buffer_and_log(direction: &str, headers: &header::HeaderMap, body: Body) -> Body {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let hint = body.size_hint();
    let small = hint.upper().is_some_and(|n| n < MAX_LOGGED_BODY as u64);
    if !content_type.contains("application/json") || !small {
        if hint.exact() != Some(0) {
            debug!(direction, content_type, size = ?hint.exact(), "body skipped");
        }
        return body;
    }

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, direction, "failed to buffer body");
            return Body::empty();
        }
    };
    if let Ok(text) = std::str::from_utf8(&bytes) {
        debug!(direction, body = text, "body");
    }
    Body::from(bytes)
}


#[cfg(test)]
mod test {
    use axum::Router;
    use axum::middleware;
    use axum::routing::post;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use super::*;
    use crate::config::Config;
    use crate::entities::MemoryStore;

    fn echo_app() -> Router {
        let state = Arc::new(AppState::new(
            Config::default(),
            Arc::new(MemoryStore::default()),
        ));
        Router::new()
            .route("/echo", post(|body: String| async move { body.len().to_string() }))
            .layer(middleware::from_fn_with_state(state.clone(), trace_middleware))
            .with_state(state)
    }

    async fn post_json(body: String) -> String {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = echo_app().oneshot(req).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn small_json_bodies_are_logged() {
        let received = post_json(r#"{"tool":"Figma"}"#.to_owned()).await;
        assert_eq!(received, "16");
        assert!(logs_contain("Figma"));
    }

    #[tokio::test]
    #[traced_test]
    async fn large_bodies_pass_through_unbuffered() {
        let payload = format!(r#"{{"description":"{}"}}"#, "x".repeat(4 * MAX_LOGGED_BODY));
        let received = post_json(payload.clone()).await;
        assert_eq!(received, payload.len().to_string());
        assert!(logs_contain("body skipped"));
        assert!(!logs_contain("xxxxxxxxxxxxxxxx"));
    }
}
