//! HTTP surface of the placeholder API.
//!
//! Routing is a pure [`RequestHandler`]: given a method and a request target
//! it produces a [`Payload`] or an [`ApiError`]. The axum side is a single
//! fallback that extracts those two values, asks the handler, writes the
//! access log, and renders the result. Headers common to every response are
//! attached by `tower-http` layers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn};

use crate::error::ApiError;

pub mod health;
pub mod payload;
pub mod request_id;

pub use health::HealthRoutes;
pub use payload::Payload;

/// Value of the `Server` header on every response.
pub const SERVER_BANNER: &str = "PlaceholderAPI/1.0";

/// Maps a request line to a response body.
///
/// Implementations must not block or perform I/O; logging is done by the
/// caller once the result is known.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, method: &Method, target: &str) -> Result<Payload, ApiError>;
}

/// Build the axum router around `handler`.
pub fn router(handler: Arc<dyn RequestHandler>) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(DefaultOnResponse::new().level(tracing::Level::DEBUG));

    Router::new()
        .fallback(dispatch)
        .with_state(handler)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_static(SERVER_BANNER),
        ))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(trace_layer)
}

async fn dispatch(State(handler): State<Arc<dyn RequestHandler>>, request: Request) -> Response {
    let method = request.method();
    // Request target as sent: absolute-form keeps its scheme and authority.
    let target = request.uri().to_string();
    let target = target.as_str();

    let outcome = handler.handle(method, target);

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    log_access(client, method, target, &outcome);

    outcome.into_response()
}

fn log_access(
    client: Option<SocketAddr>,
    method: &Method,
    target: &str,
    outcome: &Result<Payload, ApiError>,
) {
    let status = match outcome {
        Ok(_) => axum::http::StatusCode::OK,
        Err(e) => e.status_code(),
    };
    let client = client.map_or_else(|| "-".to_owned(), |addr| addr.to_string());

    match outcome {
        Err(ApiError::NotFound) => warn!(path = target, "unsupported path requested"),
        Err(ApiError::MethodNotAllowed) => warn!(%method, path = target, "unsupported method"),
        Ok(_) => {}
    }
    info!(%client, %method, path = target, status = status.as_u16(), "request served");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt; // oneshot

    use super::*;

    // -----------------------------------------------------------------------
    // Test helpers
    // -----------------------------------------------------------------------

    fn app() -> Router {
        router(Arc::new(HealthRoutes))
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
    ) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, headers, json)
    }

    fn assert_common_headers(headers: &axum::http::HeaderMap) {
        assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(headers[header::SERVER], SERVER_BANNER);
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_health_returns_ok() {
        let (status, headers, json) = send(app(), Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "status": "ok" }));
        assert_common_headers(&headers);
    }

    #[tokio::test]
    async fn unknown_paths_return_not_found() {
        for uri in ["/", "/healthz", "/foo/bar", "/health?probe=1"] {
            let (status, headers, json) = send(app(), Method::GET, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "uri {uri}");
            assert_eq!(json, serde_json::json!({ "status": "not_found" }), "uri {uri}");
            assert_common_headers(&headers);
        }
    }

    #[tokio::test]
    async fn non_get_methods_return_method_not_allowed() {
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let (status, headers, json) = send(app(), method.clone(), "/health").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {method}");
            assert_eq!(json["status"], "method_not_allowed");
            assert_eq!(headers[header::ALLOW], "GET");
            assert_common_headers(&headers);
        }
    }

    #[tokio::test]
    async fn absolute_form_target_is_not_the_health_path() {
        let (status, _, json) = send(app(), Method::GET, "http://example.com/health").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "not_found");
    }

    #[tokio::test]
    async fn body_bytes_keep_a_space_after_colon() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"status": "ok"}"#);
    }

    // -----------------------------------------------------------------------
    // Middleware
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn request_id_is_generated_and_echoed() {
        let (_, headers, _) = send(app(), Method::GET, "/health").await;
        let id = headers["x-request-id"].to_str().unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn caller_request_id_is_preserved() {
        let req = Request::builder()
            .uri("/health")
            .header("x-request-id", "probe-42")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.headers()["x-request-id"], "probe-42");
    }

    // -----------------------------------------------------------------------
    // Handler injection
    // -----------------------------------------------------------------------

    struct AlwaysOk;

    impl RequestHandler for AlwaysOk {
        fn handle(&self, _method: &Method, _target: &str) -> Result<Payload, ApiError> {
            Ok(Payload::ok())
        }
    }

    #[tokio::test]
    async fn router_delegates_to_the_supplied_handler() {
        let (status, headers, json) =
            send(router(Arc::new(AlwaysOk)), Method::GET, "/anything").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_common_headers(&headers);
    }
}
