//! Integration tests for the HTTP API in stub mode
//! Exercises validation, the envelope shape and the MCP registry routes

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use gatehouse::api::{create_router, AppState};
use gatehouse::config::{Config, ProxyMode};
use gatehouse::registry::{ProvisionTiming, ServerRegistry};
use gatehouse::ScrapingJob;

/// Router over an in-memory registry with every vendor stubbed
struct ApiTestFixture {
    pub state: AppState,
    pub router: Router,
}

impl ApiTestFixture {
    fn new() -> Self {
        let mut config = Config::default();
        config.mode = ProxyMode::Stub;
        config.webhook_base_url = Some("https://hooks.example.com".into());
        Self::with_config(config)
    }

    fn with_config(config: Config) -> Self {
        let registry = ServerRegistry::open_in_memory(ProvisionTiming::instant())
            .expect("Failed to open registry");
        let state = AppState::new(config, registry).expect("Failed to build state");
        let router = create_router(state.clone());
        Self { state, router }
    }

    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }
}

// ============================================================================
// Cursor
// ============================================================================

mod cursor_tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_workspace_is_rejected() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/cursor/connect", json!({})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Workspace"));
    }

    #[tokio::test]
    async fn test_connect_without_key_uses_development_backend() {
        let fixture = ApiTestFixture::with_config(Config::default());

        let (status, body) = fixture
            .post("/api/cursor/connect", json!({ "workspace": "/home/scrapybara/proj" }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["mode"], "stub");
        assert_eq!(body["connection"]["status"], "connected");
        assert_eq!(body["connection"]["workspace"], "/home/scrapybara/proj");
        assert!(!body["features"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_outside_prefix_is_rejected() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture
            .post("/api/cursor/connect", json!({ "workspace": "/tmp/proj" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_malformed_json_uses_envelope() {
        let fixture = ApiTestFixture::new();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/cursor/connect")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = fixture.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_sync_requires_enabled() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/cursor/sync", json!({ "files": [] })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: enabled");
    }

    #[tokio::test]
    async fn test_sync_reports_files_and_webhook() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture
            .post(
                "/api/cursor/sync",
                json!({
                    "enabled": true,
                    "files": [{ "path": "src/main.rs" }, { "path": "src/lib.rs" }],
                    "options": { "sync_interval": 60 }
                }),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["syncedFiles"], 2);
        assert_eq!(body["options"]["sync_interval"], 60);
        assert_eq!(body["options"]["auto_sync"], true);
        assert_eq!(
            body["options"]["webhook_url"],
            "https://hooks.example.com/api/cursor/webhook"
        );
        assert!(body["lastSync"].is_string());
    }

    #[tokio::test]
    async fn test_sync_disabled_syncs_nothing() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture
            .post(
                "/api/cursor/sync",
                json!({ "enabled": false, "files": [{ "path": "a.rs" }] }),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["syncedFiles"], 0);
        assert!(body["lastSync"].is_null());
    }

    #[tokio::test]
    async fn test_execute_names_missing_fields() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture
            .post("/api/code/execute", json!({ "workspace": "/home/scrapybara/proj" }))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: files, command");
    }

    #[tokio::test]
    async fn test_execute_stub_report() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture
            .post(
                "/api/code/execute",
                json!({
                    "workspace": "/home/scrapybara/proj",
                    "command": "npm test",
                    "files": [{ "path": "index.js", "content": "console.log(1)" }]
                }),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["testResults"]["total"], 1);
        assert_eq!(body["testResults"]["passed"], 0);
        assert_eq!(body["testResults"]["failed"], 0);
        assert_eq!(body["testResults"]["skipped"], 1);
        assert!(body["coverage"].is_null());
        assert!(body["output"].as_str().unwrap().contains("npm test"));
    }
}

// ============================================================================
// MCP registry
// ============================================================================

mod mcp_tests {
    use super::*;

    #[tokio::test]
    async fn test_install_twice_conflicts() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/mcp/install", json!({ "server_id": "x" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["server_id"], "x");

        let (status, body) = fixture.post("/api/mcp/install", json!({ "server_id": "x" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_start_requires_install() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/mcp/start", json!({ "server_id": "nope" })).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Server nope is not installed");
    }

    #[tokio::test]
    async fn test_stop_requires_running() {
        let fixture = ApiTestFixture::new();
        fixture.post("/api/mcp/install", json!({ "server_id": "a" })).await;

        let (status, body) = fixture.post("/api/mcp/stop", json!({ "server_id": "a" })).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_installed_reports_totals() {
        let fixture = ApiTestFixture::new();
        fixture.post("/api/mcp/install", json!({ "server_id": "a" })).await;
        let (status, _) = fixture.post("/api/mcp/start", json!({ "server_id": "a" })).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = fixture.get("/api/mcp/installed").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_installed"], 1);
        assert_eq!(body["total_running"], 1);
        assert_eq!(body["servers"], json!(["a"]));
        assert_eq!(body["running"], json!(["a"]));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let fixture = ApiTestFixture::new();

        for uri in ["/api/mcp/install", "/api/mcp/start", "/api/mcp/stop"] {
            let (status, body) = fixture.post(uri, json!({ "server_id": "github" })).await;
            assert_eq!(status, StatusCode::OK, "{} failed: {}", uri, body);
        }

        let (_, body) = fixture.get("/api/mcp/installed").await;
        assert_eq!(body["total_installed"], 1);
        assert_eq!(body["total_running"], 0);
    }

    #[tokio::test]
    async fn test_missing_server_id_is_rejected() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/mcp/install", json!({})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "server_id is required");
    }

    #[tokio::test]
    async fn test_scraping_status_reads_slot() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.get("/api/mcp/scraping/status").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["job"].is_null());

        fixture
            .state
            .scraping
            .replace(Some(ScrapingJob {
                id: "job-7".into(),
                url: "https://example.com".into(),
                status: "running".into(),
                progress: 0.5,
                started_at: Utc::now(),
            }))
            .await;

        let (_, body) = fixture.get("/api/mcp/scraping/status").await;
        assert_eq!(body["job"]["id"], "job-7");
        assert_eq!(body["job"]["status"], "running");
    }
}

// ============================================================================
// Memory, Pipedream, CopyCapy, Scrapybara (stubbed)
// ============================================================================

mod vendor_stub_tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_names_missing_content() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/memory/store", json!({ "id": "m1" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required fields: content");
    }

    #[tokio::test]
    async fn test_memory_store_stub() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture
            .post("/api/memory/store", json!({ "id": "m1", "content": "likes tea" }))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["memoryId"].as_str().unwrap().starts_with("mem_"));
    }

    #[tokio::test]
    async fn test_memory_search_requires_query() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/memory/search", json!({ "limit": 5 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: query");

        let (status, body) = fixture
            .post("/api/memory/search", json!({ "query": "tea", "filters": [1, 2] }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "filters must be an object");
    }

    #[tokio::test]
    async fn test_memory_search_and_test_stub() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/memory/search", json!({ "query": "tea" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert_eq!(body["results"], json!([]));

        let (status, body) = fixture.request(Method::POST, "/api/memory/test", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["memoriesCount"], 0);
        assert_eq!(body["status"], "development");
    }

    #[tokio::test]
    async fn test_pipedream_stub() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.request(Method::POST, "/api/pipedream/test", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["username"], "developer");
        assert_eq!(body["workflows"], 0);
    }

    #[tokio::test]
    async fn test_copycapy_requires_key() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.post("/api/research/copyCapy/test", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: apiKey");

        let (status, body) = fixture
            .post("/api/research/copyCapy/test", json!({ "apiKey": "cc-key" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accountInfo"]["plan"], "development");
    }

    #[tokio::test]
    async fn test_scrapybara_stub_is_disconnected() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.get("/api/scrapybara/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], false);
        assert_eq!(body["active_instances"], 0);
    }
}

// ============================================================================
// System
// ============================================================================

mod system_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.get("/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_emergency_brake_reports_services() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.get("/api/emergency-brake").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["systemHealth"]["status"], "healthy");
        assert_eq!(body["systemHealth"]["brake_engaged"], false);
        assert_eq!(body["availableServices"]["cursor"], "stub");
        assert_eq!(body["availableServices"]["mem0"], "stub");
        assert!(body.get("stoppedServers").is_none());
    }

    #[tokio::test]
    async fn test_emergency_brake_stops_running_servers() {
        let fixture = ApiTestFixture::new();
        for id in ["a", "b"] {
            fixture.post("/api/mcp/install", json!({ "server_id": id })).await;
        }
        fixture.post("/api/mcp/start", json!({ "server_id": "b" })).await;

        let (status, body) = fixture.request(Method::POST, "/api/emergency-brake", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stoppedServers"], json!(["b"]));
        assert_eq!(body["systemHealth"]["brake_engaged"], true);
        assert_eq!(body["systemHealth"]["running_servers"], 0);

        let (_, body) = fixture.get("/api/mcp/installed").await;
        assert_eq!(body["total_installed"], 2);
        assert_eq!(body["total_running"], 0);
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let fixture = ApiTestFixture::new();

        let (status, body) = fixture.get("/api/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/api/mcp/install").is_some());
        assert!(body["paths"].get("/api/research/copyCapy/test").is_some());
    }
}
