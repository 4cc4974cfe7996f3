//! Pipedream workflow platform backends

use async_trait::async_trait;
use serde_json::Value;

use super::client::UpstreamClient;
use crate::error::{Error, Result};
use crate::types::{BackendMode, PipedreamAccount, PipedreamUser, Vendor};

#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// Verify credentials and describe the account
    async fn account(&self) -> Result<PipedreamAccount>;
}

pub struct LivePipedream {
    client: UpstreamClient,
}

impl LivePipedream {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkflowBackend for LivePipedream {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    async fn account(&self) -> Result<PipedreamAccount> {
        let reply = self.client.get("/v1/users/me").await?;
        let data = reply.get("data").unwrap_or(&reply);

        let id = data
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Upstream {
                vendor: Vendor::Pipedream,
                status: None,
                message: "user payload has no id".into(),
            })?;

        let workflows = match data.get("workflows") {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as usize,
            _ => 0,
        };

        Ok(PipedreamAccount {
            status: "connected".to_string(),
            user: PipedreamUser {
                id: id.to_string(),
                username: data
                    .get("username")
                    .and_then(Value::as_str)
                    .unwrap_or(id)
                    .to_string(),
                email: data.get("email").and_then(Value::as_str).map(String::from),
            },
            plan: data
                .get("plan")
                .and_then(Value::as_str)
                .unwrap_or("free")
                .to_string(),
            workflows,
        })
    }
}

pub struct StubPipedream;

#[async_trait]
impl WorkflowBackend for StubPipedream {
    fn mode(&self) -> BackendMode {
        BackendMode::Stub
    }

    async fn account(&self) -> Result<PipedreamAccount> {
        Ok(PipedreamAccount {
            status: "development".to_string(),
            user: PipedreamUser {
                id: "dev-user".to_string(),
                username: "developer".to_string(),
                email: None,
            },
            plan: "development".to_string(),
            workflows: 0,
        })
    }
}
