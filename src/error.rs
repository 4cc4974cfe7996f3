//! Error types for Gatehouse

use thiserror::Error;

use crate::types::Vendor;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Server {0} is already installed")]
    AlreadyInstalled(String),

    #[error("Server {0} is not installed")]
    NotInstalled(String),

    #[error("Server {0} is already running")]
    AlreadyRunning(String),

    #[error("Server {0} is not running")]
    NotRunning(String),

    #[error("{vendor} API error: {message}")]
    Upstream {
        vendor: Vendor,
        status: Option<u16>,
        message: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an upstream error from a transport-level failure
    pub fn transport(vendor: Vendor, err: reqwest::Error) -> Self {
        let message = if err.is_connect() {
            format!("cannot connect to {}", vendor)
        } else if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };

        Error::Upstream {
            vendor,
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }

    /// Whether the failure was caused by the caller or a vendor rather than by us
    pub fn is_client_facing(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::AlreadyInstalled(_)
                | Error::NotInstalled(_)
                | Error::AlreadyRunning(_)
                | Error::NotRunning(_)
                | Error::Upstream { .. }
        )
    }
}
