// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

// HTTP surface
//
// Routes:
// - GET  /                service banner
// - GET  /health          liveness probe
// - POST /api/chat        chat turn -> text/event-stream relay
// - POST /api/day-pillar  birth form -> Ganji of the day
// - GET  /api/ganji       the sixty-entry cycle
//
// CORS is driven entirely by config; unknown origins get no CORS headers.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::calendar::{compute_day_pillar, day_pillar, sexagenary_cycle, BirthForm, Ganji};
use crate::config::CorsConfig;
use crate::relay::{ChatTurn, Relay, RelayStream};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub const BANNER: &str = "sajumon API running";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

// ---------------------------------------------------------------------------
// Service endpoints
// ---------------------------------------------------------------------------

pub async fn banner() -> &'static str {
    BANNER
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ---------------------------------------------------------------------------
// Chat relay
// ---------------------------------------------------------------------------

/// Validate the chat turn and stream the relay back as server-sent events.
///
/// Invalid bodies are rejected with 400 before any upstream call is made.
pub async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let turn = match ChatTurn::from_json(&body) {
        Ok(turn) => turn,
        Err(e) => {
            tracing::warn!(error = %e, "rejected chat body");
            return e.into_response();
        }
    };

    sse_response(state.relay.start(turn))
}

/// Wrap relay events in an unbuffered event-stream response.
///
/// Dropping the body (client disconnect) drops the `RelayStream`, which
/// cancels the upstream call.
pub fn sse_response(events: RelayStream) -> Response {
    let body = Body::from_stream(events.map(|event| Ok::<_, Infallible>(event.to_sse())));

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream; charset=utf-8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Day pillar plus its position in the sixty-day cycle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarResponse {
    #[serde(flatten)]
    pub ganji: Ganji,
    pub cycle_index: usize,
}

pub async fn day_pillar_handler(body: Bytes) -> Response {
    let form: BirthForm = match serde_json::from_slice(&body) {
        Ok(form) => form,
        Err(e) => {
            let body = serde_json::json!({
                "error": "Invalid body",
                "details": e.to_string(),
            });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    match form.validate() {
        Ok(input) => {
            let response = PillarResponse {
                ganji: compute_day_pillar(&input),
                cycle_index: day_pillar(&input).cycle_index(),
            };
            tracing::debug!(key = %response.ganji.key, "day pillar computed");
            Json(response).into_response()
        }
        Err(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
    }
}

pub async fn ganji_handler() -> Json<Vec<Ganji>> {
    Json(sexagenary_cycle().map(|p| p.ganji()).collect())
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

pub fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(cors.allowed_origins.iter().cloned()))
        .allow_methods(cors.allowed_methods.clone())
        .allow_headers(cors.allowed_headers.clone())
        .allow_credentials(cors.allow_credentials)
}

/// Build the axum router with every route, CORS and request tracing.
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/day-pillar", post(day_pillar_handler))
        .route("/api/ganji", get(ganji_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{
        ChatUpstream, ResponsesClassifier, UpstreamError, UpstreamRequest, UpstreamResponse,
    };
    use async_trait::async_trait;
    use axum::http::{Method, Request};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    /// Answers every call with a fixed SSE body and counts calls.
    struct FixedUpstream {
        body: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatUpstream for FixedUpstream {
        async fn open(
            &self,
            _request: UpstreamRequest,
            _cancel: CancellationToken,
        ) -> Result<UpstreamResponse, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let chunks: Vec<Result<Bytes, UpstreamError>> =
                vec![Ok(Bytes::from_static(self.body.as_bytes()))];
            Ok(UpstreamResponse {
                status: StatusCode::OK,
                body: Box::pin(futures_util::stream::iter(chunks)),
            })
        }
    }

    const HELLO_STREAM: &str = "event: response.output_text.delta\n\
        data: {\"type\":\"response.output_text.delta\",\"delta\":\"Hello\"}\n\n\
        event: response.completed\n\
        data: {\"type\":\"response.completed\"}\n\n";

    fn test_cors() -> CorsConfig {
        CorsConfig {
            allowed_origins: vec![HeaderValue::from_static("http://localhost:5173")],
            allowed_methods: vec![Method::GET, Method::POST, Method::OPTIONS],
            allowed_headers: vec![CONTENT_TYPE],
            allow_credentials: false,
        }
    }

    fn app() -> (Router, Arc<FixedUpstream>) {
        let upstream = Arc::new(FixedUpstream {
            body: HELLO_STREAM,
            calls: AtomicUsize::new(0),
        });
        let relay = Relay::new(upstream.clone(), Arc::new(ResponsesClassifier));
        let state = AppState {
            relay: Arc::new(relay),
        };
        (build_router(state, &test_cors()), upstream)
    }

    fn json_request(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    #[tokio::test]
    async fn banner_and_health() {
        let (app, _) = app();
        let resp = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, BANNER);

        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await, serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn chat_streams_events_with_sse_headers() {
        let (app, upstream) = app();
        let body = r#"{"sessionId":"s","archetypeId":"gye-sa","lang":"en","message":"hi"}"#;
        let resp = app.oneshot(json_request("/api/chat", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/event-stream; charset=utf-8");
        assert_eq!(headers[CACHE_CONTROL], "no-cache, no-transform");
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers["x-accel-buffering"], "no");

        assert_eq!(
            body_string(resp).await,
            "event: token\ndata: {\"token\":\"Hello\"}\n\nevent: done\ndata: {}\n\n"
        );
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_chat_body_is_rejected_without_upstream_call() {
        let (app, upstream) = app();
        for body in [
            "not json",
            r#"{"sessionId":"s","archetypeId":"a","lang":"fr","message":"hi"}"#,
            r#"{"sessionId":"","archetypeId":"a","lang":"en","message":"hi"}"#,
            r#"{"sessionId":"s","archetypeId":"a","lang":"en"}"#,
        ] {
            let resp = app
                .clone()
                .oneshot(json_request("/api/chat", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(body_json(resp).await["error"], "Invalid body");
        }
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn day_pillar_endpoint() {
        let (app, _) = app();
        let resp = app
            .oneshot(json_request(
                "/api/day-pillar",
                r#"{"year":1997,"month":1,"day":1}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["key"], "gye-myo");
        assert_eq!(json["label"], "Gye-Myo");
        assert_eq!(json["stem"], "Gye (Yin Water)");
        assert_eq!(json["branch"], "Myo (Rabbit)");
        assert_eq!(json["cycleIndex"], 39);
    }

    #[tokio::test]
    async fn day_pillar_late_zi_hour() {
        let (app, _) = app();
        let resp = app
            .oneshot(json_request(
                "/api/day-pillar",
                r#"{"year":1997,"month":1,"day":1,"hour":23,"minute":30}"#,
            ))
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["key"], "gap-jin");
    }

    #[tokio::test]
    async fn day_pillar_field_errors() {
        let (app, _) = app();
        let resp = app
            .oneshot(json_request(
                "/api/day-pillar",
                r#"{"year":2023,"month":2,"day":29,"hour":24,"minute":0}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["errors"]["day"], "That month has only 28 days.");
        assert_eq!(json["errors"]["hour"], "Hour must be 0–23.");
        assert!(json["errors"].get("minute").is_none());
    }

    #[tokio::test]
    async fn day_pillar_malformed_json() {
        let (app, _) = app();
        let resp = app
            .oneshot(json_request("/api/day-pillar", "{"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Invalid body");
    }

    #[tokio::test]
    async fn ganji_lists_the_full_cycle() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/api/ganji").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 60);
        assert_eq!(entries[0]["key"], "gap-ja");
        assert_eq!(entries[39]["key"], "gye-myo");
        assert_eq!(entries[59]["key"], "gye-hae");
    }

    #[tokio::test]
    async fn cors_preflight_for_allowed_origin() {
        let (app, _) = app();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/chat")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn cors_ignores_unknown_origin() {
        let (app, _) = app();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .header("origin", "https://evil.example")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }
}
