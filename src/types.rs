//! Core types for Gatehouse

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Third-party services the gateway fronts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Cursor,
    Scrapybara,
    Mem0,
    Pipedream,
    CopyCapy,
}

impl Vendor {
    pub const ALL: [Vendor; 5] = [
        Vendor::Cursor,
        Vendor::Scrapybara,
        Vendor::Mem0,
        Vendor::Pipedream,
        Vendor::CopyCapy,
    ];
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vendor::Cursor => "Cursor",
            Vendor::Scrapybara => "Scrapybara",
            Vendor::Mem0 => "Mem0",
            Vendor::Pipedream => "Pipedream",
            Vendor::CopyCapy => "CopyCapy",
        };
        f.write_str(name)
    }
}

/// Which backend strategy answered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Live,
    Stub,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::Live => f.write_str("live"),
            BackendMode::Stub => f.write_str("stub"),
        }
    }
}

/// An in-flight scraping job descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScrapingJob {
    pub id: String,
    pub url: String,
    pub status: String,
    /// Completion in the range 0.0..=1.0
    pub progress: f32,
    pub started_at: DateTime<Utc>,
}

/// Point-in-time view of the MCP server registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Installed server ids in install order
    pub installed: Vec<String>,
    /// Running server ids, always a subset of `installed`
    pub running: Vec<String>,
}

impl RegistrySnapshot {
    pub fn total_installed(&self) -> usize {
        self.installed.len()
    }

    pub fn total_running(&self) -> usize {
        self.running.len()
    }
}

// Cursor

/// A source file submitted for sync or execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SourceFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// State of a Cursor workspace connection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CursorConnection {
    pub status: String,
    pub workspace: String,
    pub connected_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Result of connecting a workspace
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CursorSession {
    pub features: Vec<String>,
    pub connection: CursorConnection,
}

/// Effective sync options, echoed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SyncOptions {
    #[serde(default = "default_true")]
    pub auto_sync: bool,
    /// Seconds between background syncs
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,
    #[serde(default = "default_watch_patterns")]
    pub watch_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            auto_sync: default_true(),
            sync_interval: default_sync_interval(),
            watch_patterns: default_watch_patterns(),
            webhook_url: None,
        }
    }
}

/// Outcome of a workspace sync
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncReport {
    pub synced_files: usize,
    pub options: SyncOptions,
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TestResults {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coverage {
    /// Line coverage percentage
    pub lines: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<f64>,
}

/// Outcome of running a command against a workspace
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecutionReport {
    pub output: String,
    pub test_results: TestResults,
    pub coverage: Option<Coverage>,
}

// Scrapybara

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SandboxInstance {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launched_at: Option<String>,
}

impl SandboxInstance {
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_str(), "running" | "active" | "deployed")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SandboxStatus {
    pub connected: bool,
    pub instances: Vec<SandboxInstance>,
    pub active_instances: usize,
}

// Mem0

/// A memory returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemoryHit {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MemoryUsage {
    pub stored: usize,
    pub plan_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemoryHealth {
    pub status: String,
    pub memories_count: usize,
    pub usage: MemoryUsage,
}

// Pipedream

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PipedreamUser {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PipedreamAccount {
    pub status: String,
    pub user: PipedreamUser,
    pub plan: String,
    pub workflows: usize,
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_sync_interval() -> u64 {
    30
}

fn default_watch_patterns() -> Vec<String> {
    vec!["**/*".to_string()]
}
