use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode, Uri, header},
    routing::get,
};
use flate2::{Compression, write::GzEncoder};
use serde_json::{Value, json};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt; // for `oneshot`

use livedoc::api::{AppState, build_router};
use livedoc::config::Config;
use livedoc::content::ContentClient;
use livedoc::convert::{ConvertError, ConvertedDocument, DocumentConverter, HtmlConverter};
use livedoc::documents::UpdateRouter;
use livedoc::handlers::HandlerRegistry;

/// Converter double that counts invocations
struct CountingConverter {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingConverter {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentConverter for CountingConverter {
    fn convert(&self, _html: &str, variant: &str) -> Result<ConvertedDocument, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ConvertError::UnsupportedVariant(variant.to_string()));
        }
        Ok(ConvertedDocument {
            description: json!({"type": "doc", "content": []}),
            description_binary: vec![1, 2, 3],
        })
    }
}

/// Converter that panics mid-conversion
struct PanickingConverter;

impl DocumentConverter for PanickingConverter {
    fn convert(&self, _html: &str, _variant: &str) -> Result<ConvertedDocument, ConvertError> {
        panic!("converter crashed");
    }
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn create_test_config(content_base_url: &str) -> Config {
    let config_toml = format!(
        r#"
[server]
bind_addr = "127.0.0.1:0"

[server.api]
max_payload_bytes = 4096

[content]
base_url = "{content_base_url}"
connect_timeout_ms = 1000
request_timeout_ms = 2000
user_agent = "livedoc-test"
        "#
    );

    toml::from_str(&config_toml).expect("Failed to parse test config")
}

fn app_with(config: Config, converter: Arc<dyn DocumentConverter>) -> Router {
    let client = Arc::new(ContentClient::new(&config.content).unwrap());
    let router = Arc::new(UpdateRouter::with_defaults(client.clone()));
    let registry = HandlerRegistry::with_defaults(client, router);

    build_router(AppState::new(config, registry, converter))
}

fn build_test_app(converter: Arc<dyn DocumentConverter>) -> Router {
    app_with(create_test_config("http://127.0.0.1:9"), converter)
}

fn convert_request(body: Value) -> Request<Body> {
    Request::builder()
        .uri("/convert-document")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_convert_missing_html_is_rejected_without_converting() {
    let converter = CountingConverter::new(false);
    let app = build_test_app(converter.clone());

    let response = app
        .oneshot(convert_request(json!({"variant": "rich"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Missing required fields");
    assert_eq!(converter.calls(), 0);
}

#[tokio::test]
async fn test_convert_missing_variant_is_rejected() {
    let converter = CountingConverter::new(false);
    let app = build_test_app(converter.clone());

    let response = app
        .oneshot(convert_request(json!({"description_html": "<p>x</p>"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(converter.calls(), 0);
}

#[tokio::test]
async fn test_convert_returns_exactly_two_fields() {
    let converter = CountingConverter::new(false);
    let app = build_test_app(converter.clone());

    let response = app
        .oneshot(convert_request(
            json!({"description_html": "<p>x</p>", "variant": "document"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({
            "description": {"type": "doc", "content": []},
            "description_binary": "AQID",
        })
    );
    assert_eq!(converter.calls(), 1);
}

#[tokio::test]
async fn test_convert_accepts_empty_html() {
    let converter = CountingConverter::new(false);
    let app = build_test_app(converter.clone());

    let response = app
        .oneshot(convert_request(json!({"description_html": "", "variant": "rich"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(converter.calls(), 1);
}

#[tokio::test]
async fn test_convert_failure_is_internal_error() {
    let converter = CountingConverter::new(true);
    let app = build_test_app(converter.clone());

    let response = app
        .oneshot(convert_request(
            json!({"description_html": "<p>x</p>", "variant": "slides"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Internal server error. "));
    assert!(message.contains("slides"));
}

#[tokio::test]
async fn test_convert_with_real_converter() {
    let app = build_test_app(Arc::new(HtmlConverter::new()));

    let response = app
        .oneshot(convert_request(
            json!({"description_html": "<h2>Title</h2><p>Body</p>", "variant": "document"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["description"]["type"], "doc");
    assert_eq!(body["description"]["content"][0]["type"], "heading");
    assert!(body["description_binary"].as_str().is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn test_convert_invalid_content_type() {
    let app = build_test_app(CountingConverter::new(false));

    let request = Request::builder()
        .uri("/convert-document")
        .method("POST")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(r#"{"description_html": "", "variant": "rich"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_convert_malformed_json() {
    let app = build_test_app(CountingConverter::new(false));

    let request = Request::builder()
        .uri("/convert-document")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"variant\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn test_convert_payload_too_large() {
    let app = build_test_app(CountingConverter::new(false));

    let html = "a".repeat(8192);
    let response = app
        .oneshot(convert_request(json!({"description_html": html, "variant": "rich"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_convert_gzip_body() {
    let converter = CountingConverter::new(false);
    let app = build_test_app(converter.clone());

    let compressed =
        gzip(json!({"description_html": "<p>x</p>", "variant": "rich"}).to_string().as_bytes());

    let request = Request::builder()
        .uri("/convert-document")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_ENCODING, "gzip")
        .body(Body::from(compressed))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(converter.calls(), 1);
}

#[tokio::test]
async fn test_convert_gzip_body_inflating_past_limit() {
    let converter = CountingConverter::new(false);
    let app = build_test_app(converter.clone());

    let html = "a".repeat(64 * 1024);
    let compressed =
        gzip(json!({"description_html": html, "variant": "rich"}).to_string().as_bytes());
    assert!(compressed.len() < 4096);

    let request = Request::builder()
        .uri("/convert-document")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_ENCODING, "gzip")
        .body(Body::from(compressed))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(converter.calls(), 0);
}

#[tokio::test]
async fn test_convert_null_html_is_missing() {
    let converter = CountingConverter::new(false);
    let app = build_test_app(converter.clone());

    let response = app
        .oneshot(convert_request(json!({"description_html": null, "variant": "rich"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(converter.calls(), 0);
}

#[tokio::test]
async fn test_convert_panic_is_internal_error() {
    let app = build_test_app(Arc::new(PanickingConverter));

    let response = app
        .oneshot(convert_request(json!({"description_html": "<p>x</p>", "variant": "rich"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_convert_deeply_nested_html() {
    let app = build_test_app(Arc::new(HtmlConverter::new()));

    let html = format!("{}x", "<div>".repeat(800));
    let response = app
        .oneshot(convert_request(json!({"description_html": html, "variant": "rich"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["description"]["content"][0]["content"][0]["text"], "x");
}

#[tokio::test]
async fn test_health_reports_counters() {
    let app = build_test_app(CountingConverter::new(true));

    let response = app
        .clone()
        .oneshot(convert_request(json!({"description_html": "<p>x</p>", "variant": "rich"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let request = Request::builder()
        .uri("/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();
    let health = json_body(app.oneshot(request).await.unwrap()).await;

    assert_eq!(health["metrics"]["conversions_failed"], 1);
    assert_eq!(health["metrics"]["conversions_ok"], 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_app(CountingConverter::new(false));

    let request = Request::builder()
        .uri("/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = json_body(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    let components = health["components"].as_object().unwrap();
    assert!(components.contains_key("api"));
    assert!(components.contains_key("handlers"));
}

/// Content service double: serves fixed state and records PATCH bodies
#[derive(Clone, Default)]
struct ContentService {
    patches: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn content_get(Path(rest): Path<String>) -> Result<Vec<u8>, StatusCode> {
    if rest.contains("/forbidden/") {
        return Err(StatusCode::FORBIDDEN);
    }
    if rest.contains("/empty/") {
        return Ok(Vec::new());
    }
    Ok(vec![7, 7, 7])
}

/// Records the request path as sent, percent-encoding included
async fn content_patch(
    State(service): State<ContentService>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> &'static str {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    service
        .patches
        .lock()
        .unwrap()
        .push((uri.path().to_string(), cookie, body));
    "{}"
}

async fn build_document_app() -> (Router, ContentService) {
    let service = ContentService::default();
    let content = Router::new()
        .route("/{*rest}", get(content_get).patch(content_patch))
        .with_state(service.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, content).await.unwrap();
    });

    let config = create_test_config(&format!("http://{addr}"));
    (app_with(config, CountingConverter::new(false)), service)
}

fn document_state(html: &str) -> Vec<u8> {
    HtmlConverter::new()
        .convert(html, "document")
        .unwrap()
        .description_binary
}

#[tokio::test]
async fn test_fetch_workspace_document() {
    let (app, _) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/p1?documentType=workspace_page&workspaceSlug=acme")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], &[7, 7, 7]);
}

#[tokio::test]
async fn test_fetch_empty_document_is_no_content() {
    let (app, _) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/empty?documentType=project_page&workspaceSlug=acme&projectId=pr1")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_fetch_upstream_failure_is_bad_gateway() {
    let (app, _) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/forbidden?documentType=workspace_page&workspaceSlug=acme")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["code"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn test_fetch_without_matching_handler() {
    let (app, _) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/p1?documentType=wiki_page")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("wiki_page"));
}

#[tokio::test]
async fn test_fetch_missing_param_is_bad_request() {
    let (app, _) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/p1?documentType=teamspace_page&workspaceSlug=acme")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("teamspaceId"));
}

#[tokio::test]
async fn test_store_teamspace_document_patches_content_service() {
    let (app, service) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/p9?documentType=teamspace_page&workspaceSlug=acme&teamspaceId=t1")
        .method("PUT")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::COOKIE, "session=abc")
        .body(Body::from(document_state("<p>hello</p>")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let patches = service.patches.lock().unwrap();
    assert_eq!(patches.len(), 1);
    let (path, cookie, body) = &patches[0];
    assert_eq!(path, "/api/workspaces/acme/teamspaces/t1/pages/p9/description/");
    assert_eq!(cookie.as_deref(), Some("session=abc"));
    assert_eq!(body["description_html"], "<p>hello</p>");
    assert_eq!(body["description"]["type"], "doc");
}

#[tokio::test]
async fn test_store_project_document() {
    let (app, service) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/p2?documentType=project_page&workspaceSlug=acme&projectId=pr1")
        .method("PUT")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(document_state("<h1>Plan</h1>")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let patches = service.patches.lock().unwrap();
    assert_eq!(
        patches[0].0,
        "/api/workspaces/acme/projects/pr1/pages/p2/description/"
    );
    assert_eq!(patches[0].2["description_html"], "<h1>Plan</h1>");
}

#[tokio::test]
async fn test_store_invalid_state_is_bad_request() {
    let (app, service) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/p1?documentType=workspace_page&workspaceSlug=acme")
        .method("PUT")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(vec![0xff, 0xff, 0xff]))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(service.patches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_store_requires_octet_stream() {
    let (app, _) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/p1?documentType=workspace_page&workspaceSlug=acme")
        .method("PUT")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_page_id_cannot_escape_its_segment() {
    let (app, service) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/..%2F..%2Fadmin%2Fsecrets%3Fx%3D?documentType=workspace_page&workspaceSlug=acme")
        .method("PUT")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(document_state("<p>x</p>")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let patches = service.patches.lock().unwrap();
    assert_eq!(
        patches[0].0,
        "/api/workspaces/acme/pages/..%2F..%2Fadmin%2Fsecrets%3Fx=/description/"
    );
}

#[tokio::test]
async fn test_dot_page_id_is_bad_request() {
    let (app, service) = build_document_app().await;

    let request = Request::builder()
        .uri("/documents/%2E%2E?documentType=workspace_page&workspaceSlug=acme")
        .method("PUT")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(document_state("<p>x</p>")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(service.patches.lock().unwrap().is_empty());
}
