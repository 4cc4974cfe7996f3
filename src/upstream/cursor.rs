//! Cursor coding-assistant backends

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::client::UpstreamClient;
use crate::error::Result;
use crate::types::{
    BackendMode, CursorConnection, CursorSession, ExecutionReport, SourceFile, SyncOptions,
    SyncReport, TestResults,
};

const DEFAULT_FEATURES: [&str; 5] = [
    "code-completion",
    "chat",
    "code-review",
    "refactoring",
    "test-generation",
];

#[async_trait]
pub trait CursorBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// Connect a workspace and report the enabled assistant features
    async fn connect(&self, workspace: &str) -> Result<CursorSession>;

    /// Push files to the assistant index
    async fn sync(&self, enabled: bool, files: &[SourceFile], options: SyncOptions) -> Result<SyncReport>;

    /// Run a command against workspace files
    async fn execute(&self, workspace: &str, command: &str, files: &[SourceFile]) -> Result<ExecutionReport>;
}

/// Talks to the Cursor API
pub struct LiveCursor {
    client: UpstreamClient,
}

impl LiveCursor {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CursorBackend for LiveCursor {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    async fn connect(&self, workspace: &str) -> Result<CursorSession> {
        let reply = self
            .client
            .post("/v1/workspaces/connect", &json!({ "workspace": workspace }))
            .await?;

        let features = reply
            .get("features")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(default_features);

        Ok(CursorSession {
            features,
            connection: CursorConnection {
                status: str_field(&reply, "status").unwrap_or_else(|| "connected".to_string()),
                workspace: workspace.to_string(),
                connected_at: Utc::now(),
                session_id: str_field(&reply, "session_id").or_else(|| str_field(&reply, "id")),
            },
        })
    }

    async fn sync(&self, enabled: bool, files: &[SourceFile], options: SyncOptions) -> Result<SyncReport> {
        if !enabled {
            return Ok(SyncReport {
                synced_files: 0,
                options,
                last_sync: None,
            });
        }

        let reply = self
            .client
            .post(
                "/v1/sync",
                &json!({ "enabled": enabled, "files": files, "options": options }),
            )
            .await?;

        let synced_files = reply
            .get("synced_files")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(files.len());

        let last_sync = str_field(&reply, "last_sync")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Ok(SyncReport {
            synced_files,
            options,
            last_sync: Some(last_sync),
        })
    }

    async fn execute(&self, workspace: &str, command: &str, files: &[SourceFile]) -> Result<ExecutionReport> {
        let reply = self
            .client
            .post(
                "/v1/execute",
                &json!({ "workspace": workspace, "command": command, "files": files }),
            )
            .await?;

        Ok(ExecutionReport {
            output: str_field(&reply, "output").unwrap_or_default(),
            test_results: reply
                .get("test_results")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            coverage: reply
                .get("coverage")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok()),
        })
    }
}

/// Development backend that never leaves the process
pub struct StubCursor;

#[async_trait]
impl CursorBackend for StubCursor {
    fn mode(&self) -> BackendMode {
        BackendMode::Stub
    }

    async fn connect(&self, workspace: &str) -> Result<CursorSession> {
        Ok(CursorSession {
            features: default_features(),
            connection: CursorConnection {
                status: "connected".to_string(),
                workspace: workspace.to_string(),
                connected_at: Utc::now(),
                session_id: None,
            },
        })
    }

    async fn sync(&self, enabled: bool, files: &[SourceFile], options: SyncOptions) -> Result<SyncReport> {
        Ok(SyncReport {
            synced_files: if enabled { files.len() } else { 0 },
            options,
            last_sync: enabled.then(Utc::now),
        })
    }

    async fn execute(&self, workspace: &str, command: &str, files: &[SourceFile]) -> Result<ExecutionReport> {
        // Nothing actually runs, so there is no coverage to report
        Ok(ExecutionReport {
            output: format!(
                "$ {}\n(stub) {} file(s) in {} accepted; no command was executed",
                command,
                files.len(),
                workspace
            ),
            test_results: TestResults {
                total: files.len(),
                passed: 0,
                failed: 0,
                skipped: files.len(),
            },
            coverage: None,
        })
    }
}

fn default_features() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect()
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}
