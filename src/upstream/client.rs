//! Thin JSON client for a single vendor API

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::Vendor;

/// How the API key is presented to the vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `Authorization: Token <key>`
    Token,
}

#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    vendor: Vendor,
    base_url: String,
    api_key: String,
    auth: AuthScheme,
}

impl UpstreamClient {
    pub fn new(
        http: reqwest::Client,
        vendor: Vendor,
        base_url: &str,
        api_key: &str,
        auth: AuthScheme,
    ) -> Self {
        Self {
            http,
            vendor,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            auth,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let scheme = match self.auth {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::Token => "Token",
        };

        self.http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, format!("{} {}", scheme, self.api_key))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_with_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Value> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(self.vendor, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(self.vendor, e))?;

        if !status.is_success() {
            tracing::warn!(vendor = %self.vendor, status = status.as_u16(), "upstream returned error status");
            return Err(Error::Upstream {
                vendor: self.vendor,
                status: Some(status.as_u16()),
                message: error_message(status.as_u16(), &text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| Error::Upstream {
            vendor: self.vendor,
            status: Some(status.as_u16()),
            message: format!("invalid JSON response: {}", e),
        })
    }
}

/// Pull a human-readable message out of a vendor error body
fn error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["error", "message", "detail"]
            .iter()
            .find_map(|key| match v.get(key) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Object(o)) => o.get("message").and_then(Value::as_str).map(String::from),
                _ => None,
            })
    });

    match detail {
        Some(detail) => format!("HTTP {}: {}", status, detail),
        None => format!("HTTP {}", status),
    }
}
