//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use crate::config::AppState;
use crate::error::ApiError;
use crate::handler::{gallery, params, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Verbs accepted on the image routes
const STATIC_METHODS: &str = "GET, HEAD, OPTIONS";
/// Verbs accepted on the health probes
const HEALTH_METHODS: &str = "GET, HEAD, OPTIONS";

/// Request context encapsulating information needed for static file serving
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// Generic over the body so it can be driven by hyper's `Incoming` or by an
/// in-memory body.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.config.logging.access_log;
    let mut entry = access_log.then(|| access_entry(&req, remote_addr));

    let mut response = route_request(req, &state).await;
    http::apply_headers(&mut response, &state.config.http);

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path and configuration
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // 0. CORS preflight answers on every path
    if method == Method::OPTIONS {
        return http::build_options_response();
    }

    // 1. Health check endpoints
    let health = &state.config.health;
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return match method {
            Method::GET | Method::HEAD => {
                http::json_response(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
            }
            _ => http::error_response(&ApiError::MethodNotAllowed(HEALTH_METHODS)),
        };
    }

    // 2. Gallery API
    let gallery_cfg = &state.config.gallery;
    if let Some(segment) = params::gallery_segment(&path, &gallery_cfg.api_prefix) {
        let id = match params::resolve_id(segment, req.uri().query()) {
            Ok(id) => id,
            Err(e) => return http::error_response(&e),
        };
        if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
            return resp;
        }
        return gallery::dispatch(&method, id, req.into_body(), state)
            .await
            .unwrap_or_else(|e| http::error_response(&e));
    }

    // 3. Images
    let images_prefix = gallery_cfg.images_prefix.trim_end_matches('/');
    if path
        .strip_prefix(images_prefix)
        .is_some_and(|rest| rest.starts_with('/'))
    {
        if !matches!(method, Method::GET | Method::HEAD) {
            return http::error_response(&ApiError::MethodNotAllowed(STATIC_METHODS));
        }
        let ctx = RequestContext {
            path: &path,
            is_head: method == Method::HEAD,
            if_none_match: req
                .headers()
                .get("if-none-match")
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
        };
        return static_files::serve_image(&ctx, &gallery_cfg.images_dir, &gallery_cfg.images_prefix).await;
    }

    http::build_404_response()
}

/// Reject a declared Content-Length above the limit before reading the body
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::error_response(&ApiError::PayloadTooLarge))
            }
            _ => None,
        },
    )
}

/// Collect the request-side fields of an access log line
fn access_entry<B>(req: &Request<B>, remote_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
    .to_string();
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use serde_json::Value;

    fn test_state() -> Arc<AppState> {
        let mut cfg = Config::defaults().unwrap();
        cfg.logging.access_log = false;
        Arc::new(AppState::new(&cfg))
    }

    fn remote() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: &str,
    ) -> (StatusCode, hyper::HeaderMap, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        let resp = handle_request(req, Arc::clone(state), remote()).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes)
    }

    async fn send_json(state: &Arc<AppState>, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let (status, headers, bytes) = send(state, method, uri, body).await;
        assert_eq!(headers["Content-Type"], "application/json");
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ids(list: &Value) -> Vec<i64> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_crud_walkthrough() {
        let state = test_state();

        let (status, created) = send_json(
            &state,
            Method::POST,
            "/api/gallery",
            r#"{"name":"X","image":"/images/x.png","detail":"d"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 4);
        assert_eq!(created["name"], "X");

        let (status, fetched) = send_json(&state, Method::GET, "/api/gallery/4", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, body) = send_json(&state, Method::DELETE, "/api/gallery/2", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Deleted successfully");

        let (status, list) = send_json(&state, Method::GET, "/api/gallery", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&list), vec![1, 3, 4]);

        let (status, body) = send_json(&state, Method::GET, "/api/gallery/2", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Gallery not found");

        let (status, body) = send_json(&state, Method::GET, "/api/gallery/abc", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid ID");
    }

    #[tokio::test]
    async fn test_post_ignores_client_id_and_does_not_collide() {
        let state = test_state();
        send_json(&state, Method::DELETE, "/api/gallery/1", "").await;

        let (status, created) =
            send_json(&state, Method::POST, "/api/gallery", r#"{"id":3,"name":"dup?"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 4);

        let (_, list) = send_json(&state, Method::GET, "/api/gallery", "").await;
        assert_eq!(ids(&list), vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_query_parameter_id() {
        let state = test_state();
        let (status, item) = send_json(&state, Method::GET, "/api/gallery?id=3", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["name"], "Usio Noa");

        let (status, _) = send_json(&state, Method::GET, "/api/gallery?id=x", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Trailing slash is still the collection
        let (status, list) = send_json(&state, Method::GET, "/api/gallery/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&list), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update() {
        let state = test_state();
        let (status, item) = send_json(
            &state,
            Method::PUT,
            "/api/gallery/2",
            r#"{"id":77,"name":"Zaku II","image":"/images/zaku.png","detail":"MG"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            item,
            serde_json::json!({"id": 2, "name": "Zaku II", "image": "/images/zaku.png", "detail": "MG"})
        );

        let (status, _) =
            send_json(&state, Method::PUT, "/api/gallery/9", r#"{"name":"ghost"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = send_json(&state, Method::GET, "/api/gallery", "").await;
        assert_eq!(ids(&list), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_bad_bodies() {
        let state = test_state();
        let (status, body) = send_json(&state, Method::POST, "/api/gallery", "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid JSON");

        let (status, _) = send_json(&state, Method::PUT, "/api/gallery/1", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = send_json(&state, Method::GET, "/api/gallery", "").await;
        assert_eq!(ids(&list), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let state = test_state();
        let (status, _) = send_json(&state, Method::DELETE, "/api/gallery/3", "").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send_json(&state, Method::DELETE, "/api/gallery/3", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send_json(&state, Method::DELETE, "/api/gallery/-1", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let state = test_state();
        let (status, headers, _) = send(&state, Method::PATCH, "/api/gallery/1", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers["Allow"], gallery::ITEM_METHODS);

        let (status, headers, _) = send(&state, Method::DELETE, "/api/gallery", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers["Allow"], gallery::COLLECTION_METHODS);

        let (status, _, _) = send(&state, Method::POST, "/images/a.png", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_options_everywhere() {
        let state = test_state();
        for uri in ["/api/gallery", "/api/gallery/1", "/api/gallery/abc", "/images/x.png", "/nowhere"] {
            let (status, headers, body) = send(&state, Method::OPTIONS, uri, "").await;
            assert_eq!(status, StatusCode::OK, "uri {uri}");
            assert!(body.is_empty());
            assert_eq!(headers["Access-Control-Allow-Origin"], "*");
            assert_eq!(headers["Access-Control-Allow-Headers"], "Content-Type");
        }
    }

    #[tokio::test]
    async fn test_cors_on_errors() {
        let state = test_state();
        let (status, headers, _) = send(&state, Method::GET, "/api/gallery/abc", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(
            headers["Access-Control-Allow-Methods"],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
    }

    #[tokio::test]
    async fn test_declared_body_too_large() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/gallery")
            .header("Content-Length", "999999999")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let resp = handle_request(req, Arc::clone(&state), remote()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(state.store.len().await, 3);
    }

    #[tokio::test]
    async fn test_health_and_unknown() {
        let state = test_state();
        let (status, body) = send_json(&state, Method::GET, "/healthz", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, _) = send_json(&state, Method::GET, "/readyz", "").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send_json(&state, Method::GET, "/api/galleryX", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Not Found");
    }
}
