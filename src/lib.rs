//! Gatehouse - HTTP gateway for SaaS integrations with a local MCP server registry

pub mod config;
pub mod error;
pub mod types;

pub mod registry;
pub mod upstream;
pub mod api;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
