//! MCP server registry handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::response::{ErrorResponse, Payload};
use super::routes::AppState;
use super::validate;
use crate::error::Result;
use crate::types::ScrapingJob;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ServerRequest {
    /// Identifier of the MCP server
    pub server_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServerActionResponse {
    pub success: bool,
    pub server_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstalledServersResponse {
    pub success: bool,
    /// Installed server ids in install order
    pub servers: Vec<String>,
    /// Running server ids
    pub running: Vec<String>,
    pub total_installed: usize,
    pub total_running: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScrapingStatusResponse {
    pub success: bool,
    pub job: Option<ScrapingJob>,
}

/// Install an MCP server
#[utoipa::path(
    post,
    path = "/api/mcp/install",
    request_body = ServerRequest,
    responses(
        (status = 200, description = "Server installed", body = ServerActionResponse),
        (status = 400, description = "Invalid server id", body = ErrorResponse),
        (status = 409, description = "Already installed", body = ErrorResponse)
    ),
    tag = "mcp"
)]
pub async fn install(
    State(state): State<AppState>,
    Payload(req): Payload<ServerRequest>,
) -> Result<Json<ServerActionResponse>> {
    let server_id = validate::server_id(req.server_id.as_deref())?;

    state.registry.install(server_id).await?;
    tracing::info!(server_id, "MCP server installed");

    Ok(Json(ServerActionResponse {
        success: true,
        server_id: server_id.to_string(),
        message: format!("Server {} installed successfully", server_id),
    }))
}

/// Start an installed MCP server
#[utoipa::path(
    post,
    path = "/api/mcp/start",
    request_body = ServerRequest,
    responses(
        (status = 200, description = "Server started", body = ServerActionResponse),
        (status = 400, description = "Invalid server id", body = ErrorResponse),
        (status = 404, description = "Not installed", body = ErrorResponse),
        (status = 409, description = "Already running", body = ErrorResponse)
    ),
    tag = "mcp"
)]
pub async fn start(
    State(state): State<AppState>,
    Payload(req): Payload<ServerRequest>,
) -> Result<Json<ServerActionResponse>> {
    let server_id = validate::server_id(req.server_id.as_deref())?;

    state.registry.start(server_id).await?;
    tracing::info!(server_id, "MCP server started");

    Ok(Json(ServerActionResponse {
        success: true,
        server_id: server_id.to_string(),
        message: format!("Server {} started successfully", server_id),
    }))
}

/// Stop a running MCP server
#[utoipa::path(
    post,
    path = "/api/mcp/stop",
    request_body = ServerRequest,
    responses(
        (status = 200, description = "Server stopped", body = ServerActionResponse),
        (status = 400, description = "Invalid server id", body = ErrorResponse),
        (status = 409, description = "Not running", body = ErrorResponse)
    ),
    tag = "mcp"
)]
pub async fn stop(
    State(state): State<AppState>,
    Payload(req): Payload<ServerRequest>,
) -> Result<Json<ServerActionResponse>> {
    let server_id = validate::server_id(req.server_id.as_deref())?;

    state.registry.stop(server_id).await?;
    tracing::info!(server_id, "MCP server stopped");

    Ok(Json(ServerActionResponse {
        success: true,
        server_id: server_id.to_string(),
        message: format!("Server {} stopped successfully", server_id),
    }))
}

/// List installed and running MCP servers
#[utoipa::path(
    get,
    path = "/api/mcp/installed",
    responses(
        (status = 200, description = "Registry contents", body = InstalledServersResponse)
    ),
    tag = "mcp"
)]
pub async fn installed(State(state): State<AppState>) -> Result<Json<InstalledServersResponse>> {
    let snapshot = state.registry.snapshot()?;

    Ok(Json(InstalledServersResponse {
        success: true,
        total_installed: snapshot.total_installed(),
        total_running: snapshot.total_running(),
        servers: snapshot.installed,
        running: snapshot.running,
    }))
}

/// Current scraping job, if any
#[utoipa::path(
    get,
    path = "/api/mcp/scraping/status",
    responses(
        (status = 200, description = "Scraping job slot", body = ScrapingStatusResponse)
    ),
    tag = "mcp"
)]
pub async fn scraping_status(State(state): State<AppState>) -> Json<ScrapingStatusResponse> {
    Json(ScrapingStatusResponse {
        success: true,
        job: state.scraping.current().await,
    })
}
