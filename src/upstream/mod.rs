//! Vendor backends.
//!
//! Each vendor has a trait with a live implementation that calls the vendor
//! API and a stub implementation that answers in-process. [`Backends`] picks
//! one per vendor from [`ProxyMode`] when the server starts.

mod client;
mod copycapy;
mod cursor;
mod mem0;
mod pipedream;
mod scrapybara;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub use client::{AuthScheme, UpstreamClient};
pub use copycapy::{LiveCopyCapy, ResearchBackend, StubCopyCapy};
pub use cursor::{CursorBackend, LiveCursor, StubCursor};
pub use mem0::{LiveMem0, MemoryBackend, StubMem0};
pub use pipedream::{LivePipedream, StubPipedream, WorkflowBackend};
pub use scrapybara::{LiveScrapybara, SandboxBackend, StubScrapybara};

use crate::config::{Config, ProxyMode};
use crate::error::{Error, Result};
use crate::types::{BackendMode, Vendor};

/// The backend chosen for every vendor
#[derive(Clone)]
pub struct Backends {
    pub cursor: Arc<dyn CursorBackend>,
    pub scrapybara: Arc<dyn SandboxBackend>,
    pub memory: Arc<dyn MemoryBackend>,
    pub pipedream: Arc<dyn WorkflowBackend>,
    pub copycapy: Arc<dyn ResearchBackend>,
    http: reqwest::Client,
    mode: ProxyMode,
    cursor_base_url: String,
}

impl Backends {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("gatehouse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let client_for = |vendor: Vendor, auth: AuthScheme| -> Result<Option<UpstreamClient>> {
            let vendor_config = config.vendors.get(vendor);
            match (config.mode, vendor_config.api_key()) {
                (ProxyMode::Stub, _) => Ok(None),
                (_, Some(key)) => Ok(Some(UpstreamClient::new(
                    http.clone(),
                    vendor,
                    &vendor_config.base_url,
                    key,
                    auth,
                ))),
                (ProxyMode::Live, None) => Err(Error::Config(format!(
                    "mode = live requires an API key for {}",
                    vendor
                ))),
                (ProxyMode::Auto, None) => Ok(None),
            }
        };

        let cursor: Arc<dyn CursorBackend> = match client_for(Vendor::Cursor, AuthScheme::Bearer)? {
            Some(client) => Arc::new(LiveCursor::new(client)),
            None => Arc::new(StubCursor),
        };
        let scrapybara: Arc<dyn SandboxBackend> =
            match client_for(Vendor::Scrapybara, AuthScheme::Bearer)? {
                Some(client) => Arc::new(LiveScrapybara::new(client)),
                None => Arc::new(StubScrapybara),
            };
        let memory: Arc<dyn MemoryBackend> = match client_for(Vendor::Mem0, AuthScheme::Token)? {
            Some(client) => Arc::new(LiveMem0::new(client, config.memory.user_id.clone())),
            None => Arc::new(StubMem0),
        };
        let pipedream: Arc<dyn WorkflowBackend> =
            match client_for(Vendor::Pipedream, AuthScheme::Bearer)? {
                Some(client) => Arc::new(LivePipedream::new(client)),
                None => Arc::new(StubPipedream),
            };
        // CopyCapy keys arrive with each request
        let copycapy: Arc<dyn ResearchBackend> = match config.mode {
            ProxyMode::Stub => Arc::new(StubCopyCapy),
            _ => Arc::new(LiveCopyCapy::new(
                http.clone(),
                config.vendors.copycapy.base_url.clone(),
            )),
        };

        let backends = Self {
            cursor,
            scrapybara,
            memory,
            pipedream,
            copycapy,
            http,
            mode: config.mode,
            cursor_base_url: config.vendors.cursor.base_url.clone(),
        };

        for (vendor, mode) in backends.available_services() {
            tracing::info!(vendor = %vendor, mode = %mode, "backend selected");
        }

        Ok(backends)
    }

    /// Cursor backend for a request, honouring a caller-supplied key
    pub fn cursor_with_key(&self, api_key: Option<&str>) -> Arc<dyn CursorBackend> {
        match api_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) if self.mode != ProxyMode::Stub => Arc::new(LiveCursor::new(UpstreamClient::new(
                self.http.clone(),
                Vendor::Cursor,
                &self.cursor_base_url,
                key,
                AuthScheme::Bearer,
            ))),
            _ => self.cursor.clone(),
        }
    }

    pub fn mode_of(&self, vendor: Vendor) -> BackendMode {
        match vendor {
            Vendor::Cursor => self.cursor.mode(),
            Vendor::Scrapybara => self.scrapybara.mode(),
            Vendor::Mem0 => self.memory.mode(),
            Vendor::Pipedream => self.pipedream.mode(),
            Vendor::CopyCapy => self.copycapy.mode(),
        }
    }

    /// Vendor to backend mode, keyed by vendor name
    pub fn available_services(&self) -> BTreeMap<Vendor, BackendMode> {
        Vendor::ALL
            .iter()
            .map(|vendor| (*vendor, self.mode_of(*vendor)))
            .collect()
    }
}
