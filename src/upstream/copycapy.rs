//! CopyCapy research service backends
//!
//! CopyCapy keys are supplied per request, so the live backend builds a
//! client for every call instead of holding one.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::{AuthScheme, UpstreamClient};
use crate::error::Result;
use crate::types::{BackendMode, Vendor};

#[async_trait]
pub trait ResearchBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// Validate a key and return the vendor's account description
    async fn account_info(&self, api_key: &str) -> Result<Value>;
}

pub struct LiveCopyCapy {
    http: reqwest::Client,
    base_url: String,
}

impl LiveCopyCapy {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ResearchBackend for LiveCopyCapy {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    async fn account_info(&self, api_key: &str) -> Result<Value> {
        let client = UpstreamClient::new(
            self.http.clone(),
            Vendor::CopyCapy,
            &self.base_url,
            api_key,
            AuthScheme::Bearer,
        );
        let reply = client.get("/v1/account").await?;
        Ok(reply.get("account").cloned().unwrap_or(reply))
    }
}

pub struct StubCopyCapy;

#[async_trait]
impl ResearchBackend for StubCopyCapy {
    fn mode(&self) -> BackendMode {
        BackendMode::Stub
    }

    async fn account_info(&self, _api_key: &str) -> Result<Value> {
        Ok(json!({
            "plan": "development",
            "credits_remaining": null,
            "valid": true,
        }))
    }
}
