//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    self, ConnectRequest, ConnectResponse, CopyCapyTestRequest, CopyCapyTestResponse,
    EmergencyBrakeResponse, ExecuteRequest, ExecuteResponse, HealthResponse, MemorySearchRequest,
    MemorySearchResponse, MemoryStoreRequest, MemoryStoreResponse, MemoryTestResponse,
    PipedreamTestResponse, ScrapybaraStatusResponse, SyncRequest, SyncResponse, SystemHealth,
};
use super::registry::{
    self, InstalledServersResponse, ScrapingStatusResponse, ServerActionResponse, ServerRequest,
};
use super::response::ErrorResponse;
use crate::config::Config;
use crate::error::Result;
use crate::registry::{ScrapingJobSlot, ServerRegistry};
use crate::types::{
    BackendMode, Coverage, CursorConnection, MemoryHit, MemoryUsage, PipedreamUser,
    SandboxInstance, ScrapingJob, SourceFile, SyncOptions, TestResults,
};
use crate::upstream::Backends;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gatehouse API",
        version = "0.1.0",
        description = "Gateway for SaaS integrations with a local MCP server registry"
    ),
    tags(
        (name = "cursor", description = "Coding assistant integration"),
        (name = "scrapybara", description = "Remote sandbox status"),
        (name = "memory", description = "Long-term memory store"),
        (name = "pipedream", description = "Workflow automation"),
        (name = "research", description = "Research service"),
        (name = "mcp", description = "MCP server registry"),
        (name = "system", description = "Emergency brake and health"),
        (name = "health", description = "Health checks")
    ),
    paths(
        handlers::health,
        handlers::cursor_connect,
        handlers::cursor_sync,
        handlers::code_execute,
        handlers::scrapybara_status,
        handlers::emergency_brake_status,
        handlers::emergency_brake_engage,
        handlers::memory_search,
        handlers::memory_store,
        handlers::memory_test,
        handlers::pipedream_test,
        handlers::copycapy_test,
        registry::install,
        registry::start,
        registry::stop,
        registry::installed,
        registry::scraping_status,
    ),
    components(schemas(
        BackendMode,
        SourceFile,
        SyncOptions,
        CursorConnection,
        TestResults,
        Coverage,
        SandboxInstance,
        MemoryHit,
        MemoryUsage,
        PipedreamUser,
        ScrapingJob,
        ConnectRequest,
        ConnectResponse,
        SyncRequest,
        SyncResponse,
        ExecuteRequest,
        ExecuteResponse,
        ScrapybaraStatusResponse,
        SystemHealth,
        EmergencyBrakeResponse,
        MemorySearchRequest,
        MemorySearchResponse,
        MemoryStoreRequest,
        MemoryStoreResponse,
        MemoryTestResponse,
        PipedreamTestResponse,
        CopyCapyTestRequest,
        CopyCapyTestResponse,
        ServerRequest,
        ServerActionResponse,
        InstalledServersResponse,
        ScrapingStatusResponse,
        HealthResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ServerRegistry>,
    pub scraping: Arc<ScrapingJobSlot>,
    pub backends: Backends,
    /// When the emergency brake was last engaged
    pub brake: Arc<RwLock<Option<DateTime<Utc>>>>,
    pub started_at: Instant,
}

impl AppState {
    /// Build state, selecting vendor backends from the config
    pub fn new(config: Config, registry: ServerRegistry) -> Result<Self> {
        let backends = Backends::from_config(&config)?;

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            scraping: Arc::new(ScrapingJobSlot::new()),
            backends,
            brake: Arc::new(RwLock::new(None)),
            started_at: Instant::now(),
        })
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let openapi = ApiDoc::openapi();

    Router::new()
        // Cursor
        .route("/api/cursor/connect", post(handlers::cursor_connect))
        .route("/api/cursor/sync", post(handlers::cursor_sync))
        .route("/api/code/execute", post(handlers::code_execute))

        // Sandbox
        .route("/api/scrapybara/status", get(handlers::scrapybara_status))

        // Memory
        .route("/api/memory/search", post(handlers::memory_search))
        .route("/api/memory/store", post(handlers::memory_store))
        .route("/api/memory/test", post(handlers::memory_test))

        // Workflows and research
        .route("/api/pipedream/test", post(handlers::pipedream_test))
        .route("/api/research/copyCapy/test", post(handlers::copycapy_test))

        // MCP registry
        .route("/api/mcp/install", post(registry::install))
        .route("/api/mcp/start", post(registry::start))
        .route("/api/mcp/stop", post(registry::stop))
        .route("/api/mcp/installed", get(registry::installed))
        .route("/api/mcp/scraping/status", get(registry::scraping_status))

        // System
        .route(
            "/api/emergency-brake",
            get(handlers::emergency_brake_status).post(handlers::emergency_brake_engage),
        )
        .route("/health", get(handlers::health))

        // OpenAPI spec and Swagger UI
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
