//! Scrapybara sandbox backends

use async_trait::async_trait;
use serde_json::Value;

use super::client::UpstreamClient;
use crate::error::{Error, Result};
use crate::types::{BackendMode, SandboxInstance, SandboxStatus, Vendor};

#[async_trait]
pub trait SandboxBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    async fn status(&self) -> Result<SandboxStatus>;
}

pub struct LiveScrapybara {
    client: UpstreamClient,
}

impl LiveScrapybara {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SandboxBackend for LiveScrapybara {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    async fn status(&self) -> Result<SandboxStatus> {
        let reply = self.client.get("/v1/instances").await?;

        // Either a bare array or `{ "instances": [...] }`
        let items = match &reply {
            Value::Array(items) => items.clone(),
            other => other
                .get("instances")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };

        let instances: Vec<SandboxInstance> = items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Upstream {
                vendor: Vendor::Scrapybara,
                status: None,
                message: format!("unexpected instance payload: {}", e),
            })?;

        let active_instances = instances.iter().filter(|i| i.is_active()).count();
        Ok(SandboxStatus {
            connected: true,
            instances,
            active_instances,
        })
    }
}

/// Reports a disconnected sandbox without calling out
pub struct StubScrapybara;

#[async_trait]
impl SandboxBackend for StubScrapybara {
    fn mode(&self) -> BackendMode {
        BackendMode::Stub
    }

    async fn status(&self) -> Result<SandboxStatus> {
        Ok(SandboxStatus {
            connected: false,
            instances: Vec::new(),
            active_instances: 0,
        })
    }
}
