//! Vendor proxy handlers

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::response::{ErrorResponse, Payload};
use super::routes::AppState;
use super::validate;
use crate::error::{Error, Result};
use crate::types::{
    BackendMode, CursorConnection, Coverage, MemoryHit, MemoryUsage, PipedreamUser,
    SandboxInstance, SourceFile, SyncOptions, TestResults, Vendor,
};

// Request bodies

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    /// Workspace path under the allowed prefix
    pub workspace: Option<String>,
    /// Cursor key overriding the configured one
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SyncRequest {
    /// Whether syncing is turned on
    pub enabled: Option<bool>,
    /// Files to push
    #[serde(default)]
    pub files: Vec<SourceFile>,
    /// Sync behaviour; unspecified fields use defaults
    pub options: Option<SyncOptions>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExecuteRequest {
    pub workspace: Option<String>,
    pub command: Option<String>,
    #[serde(default)]
    pub files: Vec<SourceFile>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemorySearchRequest {
    pub query: Option<String>,
    /// Vendor-specific filter object
    #[schema(value_type = Option<Object>)]
    pub filters: Option<Value>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemoryStoreRequest {
    pub id: Option<String>,
    pub content: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CopyCapyTestRequest {
    pub api_key: Option<String>,
}

// Response types

#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectResponse {
    pub success: bool,
    pub mode: BackendMode,
    pub features: Vec<String>,
    pub connection: CursorConnection,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub mode: BackendMode,
    pub synced_files: usize,
    pub options: SyncOptions,
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    pub mode: BackendMode,
    pub output: String,
    pub test_results: TestResults,
    pub coverage: Option<Coverage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScrapybaraStatusResponse {
    pub success: bool,
    pub mode: BackendMode,
    pub connected: bool,
    pub instances: Vec<SandboxInstance>,
    pub active_instances: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SystemHealth {
    /// "healthy", or "halted" while the brake is engaged
    pub status: String,
    pub brake_engaged: bool,
    pub engaged_at: Option<DateTime<Utc>>,
    pub running_servers: usize,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyBrakeResponse {
    pub success: bool,
    pub system_health: SystemHealth,
    /// Vendor name to backend mode
    #[schema(value_type = Object)]
    pub available_services: BTreeMap<Vendor, BackendMode>,
    /// Servers stopped by this call (POST only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_servers: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemorySearchResponse {
    pub success: bool,
    pub mode: BackendMode,
    pub results: Vec<MemoryHit>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStoreResponse {
    pub success: bool,
    pub mode: BackendMode,
    pub memory_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemoryTestResponse {
    pub success: bool,
    pub mode: BackendMode,
    pub status: String,
    pub memories_count: usize,
    pub usage: MemoryUsage,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PipedreamTestResponse {
    pub success: bool,
    pub mode: BackendMode,
    pub status: String,
    pub user: PipedreamUser,
    pub plan: String,
    pub workflows: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CopyCapyTestResponse {
    pub success: bool,
    pub mode: BackendMode,
    #[schema(value_type = Object)]
    pub account_info: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
}

// Handlers

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Connect a workspace to Cursor
#[utoipa::path(
    post,
    path = "/api/cursor/connect",
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Workspace connected", body = ConnectResponse),
        (status = 400, description = "Invalid workspace or upstream failure", body = ErrorResponse)
    ),
    tag = "cursor"
)]
pub async fn cursor_connect(
    State(state): State<AppState>,
    Payload(req): Payload<ConnectRequest>,
) -> Result<Json<ConnectResponse>> {
    let workspace = validate::workspace(&state.config.workspace_prefix, req.workspace.as_deref())?;

    let backend = state.backends.cursor_with_key(req.api_key.as_deref());
    let session = backend.connect(workspace).await?;

    tracing::info!(workspace, mode = %backend.mode(), "cursor workspace connected");

    Ok(Json(ConnectResponse {
        success: true,
        mode: backend.mode(),
        features: session.features,
        connection: session.connection,
    }))
}

/// Sync files to Cursor
#[utoipa::path(
    post,
    path = "/api/cursor/sync",
    request_body = SyncRequest,
    responses(
        (status = 200, description = "Sync finished", body = SyncResponse),
        (status = 400, description = "Invalid request or upstream failure", body = ErrorResponse)
    ),
    tag = "cursor"
)]
pub async fn cursor_sync(
    State(state): State<AppState>,
    Payload(req): Payload<SyncRequest>,
) -> Result<Json<SyncResponse>> {
    let enabled = req
        .enabled
        .ok_or_else(|| Error::Validation("Missing required fields: enabled".into()))?;

    let mut options = req.options.unwrap_or_default();
    if options.webhook_url.is_none() {
        options.webhook_url = state.config.webhook_url("/api/cursor/webhook");
    }

    let backend = &state.backends.cursor;
    let report = backend.sync(enabled, &req.files, options).await?;

    tracing::info!(enabled, synced = report.synced_files, "cursor sync");

    Ok(Json(SyncResponse {
        success: true,
        mode: backend.mode(),
        synced_files: report.synced_files,
        options: report.options,
        last_sync: report.last_sync,
    }))
}

/// Run a command against workspace files
#[utoipa::path(
    post,
    path = "/api/code/execute",
    request_body = ExecuteRequest,
    responses(
        (status = 200, description = "Execution report", body = ExecuteResponse),
        (status = 400, description = "Invalid request or upstream failure", body = ErrorResponse)
    ),
    tag = "cursor"
)]
pub async fn code_execute(
    State(state): State<AppState>,
    Payload(req): Payload<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>> {
    validate::require_fields(&[
        ("files", !req.files.is_empty()),
        ("command", validate::present(&req.command)),
        ("workspace", validate::present(&req.workspace)),
    ])?;
    let workspace = validate::workspace(&state.config.workspace_prefix, req.workspace.as_deref())?;
    let command = req.command.as_deref().unwrap_or_default().trim();

    let backend = &state.backends.cursor;
    let report = backend.execute(workspace, command, &req.files).await?;

    Ok(Json(ExecuteResponse {
        success: true,
        mode: backend.mode(),
        output: report.output,
        test_results: report.test_results,
        coverage: report.coverage,
    }))
}

/// Scrapybara sandbox connectivity and instances
#[utoipa::path(
    get,
    path = "/api/scrapybara/status",
    responses(
        (status = 200, description = "Sandbox status", body = ScrapybaraStatusResponse),
        (status = 400, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "scrapybara"
)]
pub async fn scrapybara_status(State(state): State<AppState>) -> Result<Json<ScrapybaraStatusResponse>> {
    let backend = &state.backends.scrapybara;
    let status = backend.status().await?;

    Ok(Json(ScrapybaraStatusResponse {
        success: true,
        mode: backend.mode(),
        connected: status.connected,
        instances: status.instances,
        active_instances: status.active_instances,
    }))
}

/// Report system health
#[utoipa::path(
    get,
    path = "/api/emergency-brake",
    responses(
        (status = 200, description = "Current health", body = EmergencyBrakeResponse)
    ),
    tag = "system"
)]
pub async fn emergency_brake_status(State(state): State<AppState>) -> Result<Json<EmergencyBrakeResponse>> {
    brake_response(&state, None).await.map(Json)
}

/// Stop every running MCP server
#[utoipa::path(
    post,
    path = "/api/emergency-brake",
    responses(
        (status = 200, description = "Brake engaged", body = EmergencyBrakeResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "system"
)]
pub async fn emergency_brake_engage(State(state): State<AppState>) -> Result<Json<EmergencyBrakeResponse>> {
    let stopped = state.registry.stop_all()?;
    *state.brake.write().await = Some(Utc::now());

    tracing::warn!(stopped = stopped.len(), "emergency brake engaged");

    brake_response(&state, Some(stopped)).await.map(Json)
}

async fn brake_response(
    state: &AppState,
    stopped_servers: Option<Vec<String>>,
) -> Result<EmergencyBrakeResponse> {
    let engaged_at = *state.brake.read().await;
    let snapshot = state.registry.snapshot()?;

    Ok(EmergencyBrakeResponse {
        success: true,
        system_health: SystemHealth {
            status: if engaged_at.is_some() { "halted" } else { "healthy" }.to_string(),
            brake_engaged: engaged_at.is_some(),
            engaged_at,
            running_servers: snapshot.total_running(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
        },
        available_services: state.backends.available_services(),
        stopped_servers,
    })
}

/// Search long-term memories
#[utoipa::path(
    post,
    path = "/api/memory/search",
    request_body = MemorySearchRequest,
    responses(
        (status = 200, description = "Matching memories", body = MemorySearchResponse),
        (status = 400, description = "Invalid request or upstream failure", body = ErrorResponse)
    ),
    tag = "memory"
)]
pub async fn memory_search(
    State(state): State<AppState>,
    Payload(req): Payload<MemorySearchRequest>,
) -> Result<Json<MemorySearchResponse>> {
    validate::require_fields(&[("query", validate::present(&req.query))])?;
    let query = req.query.as_deref().unwrap_or_default().trim();

    if let Some(filters) = &req.filters {
        if !filters.is_object() {
            return Err(Error::Validation("filters must be an object".into()));
        }
    }

    let limits = &state.config.memory;
    let limit = req.limit.unwrap_or(limits.default_limit).min(limits.max_limit).max(1);

    let backend = &state.backends.memory;
    let results = backend.search(query, req.filters.as_ref(), limit).await?;

    let total = results.len();
    Ok(Json(MemorySearchResponse {
        success: true,
        mode: backend.mode(),
        results,
        total,
    }))
}

/// Store a memory
#[utoipa::path(
    post,
    path = "/api/memory/store",
    request_body = MemoryStoreRequest,
    responses(
        (status = 200, description = "Memory stored", body = MemoryStoreResponse),
        (status = 400, description = "Missing fields or upstream failure", body = ErrorResponse)
    ),
    tag = "memory"
)]
pub async fn memory_store(
    State(state): State<AppState>,
    Payload(req): Payload<MemoryStoreRequest>,
) -> Result<Json<MemoryStoreResponse>> {
    validate::require_fields(&[
        ("id", validate::present(&req.id)),
        ("content", validate::present(&req.content)),
    ])?;
    let id = req.id.as_deref().unwrap_or_default().trim();
    let content = req.content.as_deref().unwrap_or_default();

    let backend = &state.backends.memory;
    let memory_id = backend.store(id, content, req.metadata.as_ref()).await?;

    tracing::info!(id, memory_id = %memory_id, "memory stored");

    Ok(Json(MemoryStoreResponse {
        success: true,
        mode: backend.mode(),
        memory_id,
    }))
}

/// Check the memory store connection
#[utoipa::path(
    post,
    path = "/api/memory/test",
    responses(
        (status = 200, description = "Memory store reachable", body = MemoryTestResponse),
        (status = 400, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "memory"
)]
pub async fn memory_test(State(state): State<AppState>) -> Result<Json<MemoryTestResponse>> {
    let backend = &state.backends.memory;
    let health = backend.health().await?;

    Ok(Json(MemoryTestResponse {
        success: true,
        mode: backend.mode(),
        status: health.status,
        memories_count: health.memories_count,
        usage: health.usage,
    }))
}

/// Check the Pipedream connection
#[utoipa::path(
    post,
    path = "/api/pipedream/test",
    responses(
        (status = 200, description = "Pipedream account", body = PipedreamTestResponse),
        (status = 400, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "pipedream"
)]
pub async fn pipedream_test(State(state): State<AppState>) -> Result<Json<PipedreamTestResponse>> {
    let backend = &state.backends.pipedream;
    let account = backend.account().await?;

    Ok(Json(PipedreamTestResponse {
        success: true,
        mode: backend.mode(),
        status: account.status,
        user: account.user,
        plan: account.plan,
        workflows: account.workflows,
    }))
}

/// Validate a CopyCapy key
#[utoipa::path(
    post,
    path = "/api/research/copyCapy/test",
    request_body = CopyCapyTestRequest,
    responses(
        (status = 200, description = "Key accepted", body = CopyCapyTestResponse),
        (status = 400, description = "Missing key or upstream failure", body = ErrorResponse)
    ),
    tag = "research"
)]
pub async fn copycapy_test(
    State(state): State<AppState>,
    Payload(req): Payload<CopyCapyTestRequest>,
) -> Result<Json<CopyCapyTestResponse>> {
    validate::require_fields(&[("apiKey", validate::present(&req.api_key))])?;
    let api_key = req.api_key.as_deref().unwrap_or_default().trim();

    let backend = &state.backends.copycapy;
    let account_info = backend.account_info(api_key).await?;

    Ok(Json(CopyCapyTestResponse {
        success: true,
        mode: backend.mode(),
        account_info,
    }))
}
