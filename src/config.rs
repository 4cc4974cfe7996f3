//! Configuration for Gatehouse

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::Vendor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for the registry database (default: ~/.gatehouse)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// How vendor backends are selected
    #[serde(default)]
    pub mode: ProxyMode,

    /// Workspace paths must live under this prefix
    #[serde(default = "default_workspace_prefix")]
    pub workspace_prefix: String,

    /// Public base URL used to build webhook callbacks
    #[serde(default)]
    pub webhook_base_url: Option<String>,

    /// Timeout for every upstream request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Per-vendor endpoints and credentials
    #[serde(default)]
    pub vendors: VendorsConfig,

    /// MCP registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Memory search settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Backend selection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    /// Live when a credential is configured, stub otherwise
    #[default]
    Auto,
    /// Always call the vendor; missing credentials are a startup error
    Live,
    /// Never leave the process
    Stub,
}

impl FromStr for ProxyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ProxyMode::Auto),
            "live" => Ok(ProxyMode::Live),
            "stub" | "mock" | "development" => Ok(ProxyMode::Stub),
            other => Err(Error::Config(format!("Unknown mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub base_url: String,

    /// Never written back to disk
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

impl VendorConfig {
    fn with_base(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
        }
    }

    /// Configured key, treating blank values as unset
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorsConfig {
    #[serde(default = "default_cursor")]
    pub cursor: VendorConfig,
    #[serde(default = "default_scrapybara")]
    pub scrapybara: VendorConfig,
    #[serde(default = "default_mem0")]
    pub mem0: VendorConfig,
    #[serde(default = "default_pipedream")]
    pub pipedream: VendorConfig,
    #[serde(default = "default_copycapy")]
    pub copycapy: VendorConfig,
}

impl VendorsConfig {
    pub fn get(&self, vendor: Vendor) -> &VendorConfig {
        match vendor {
            Vendor::Cursor => &self.cursor,
            Vendor::Scrapybara => &self.scrapybara,
            Vendor::Mem0 => &self.mem0,
            Vendor::Pipedream => &self.pipedream,
            Vendor::CopyCapy => &self.copycapy,
        }
    }

    pub fn get_mut(&mut self, vendor: Vendor) -> &mut VendorConfig {
        match vendor {
            Vendor::Cursor => &mut self.cursor,
            Vendor::Scrapybara => &mut self.scrapybara,
            Vendor::Mem0 => &mut self.mem0,
            Vendor::Pipedream => &mut self.pipedream,
            Vendor::CopyCapy => &mut self.copycapy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Keep registry state in `data_dir/registry.db` instead of memory
    #[serde(default = "default_persist")]
    pub persist: bool,

    /// Simulated provisioning time for install
    #[serde(default = "default_install_delay_ms")]
    pub install_delay_ms: u64,

    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,

    #[serde(default = "default_stop_delay_ms")]
    pub stop_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Default number of search results
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,

    /// Maximum number of search results
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Mem0 user that owns stored memories
    #[serde(default = "default_memory_user")]
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            http_port: default_http_port(),
            bind_address: default_bind_address(),
            mode: ProxyMode::default(),
            workspace_prefix: default_workspace_prefix(),
            webhook_base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            vendors: VendorsConfig::default(),
            registry: RegistryConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for VendorsConfig {
    fn default() -> Self {
        Self {
            cursor: default_cursor(),
            scrapybara: default_scrapybara(),
            mem0: default_mem0(),
            pipedream: default_pipedream(),
            copycapy: default_copycapy(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            persist: default_persist(),
            install_delay_ms: default_install_delay_ms(),
            start_delay_ms: default_start_delay_ms(),
            stop_delay_ms: default_stop_delay_ms(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            max_limit: default_max_limit(),
            user_id: default_memory_user(),
        }
    }
}

impl Config {
    /// Load config from an explicit file, the default location, or defaults,
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::read(path, true)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read the config file if it exists, otherwise start from defaults.
    /// Environment overrides are not applied, so the result is safe to save.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        Self::read(path, false)
    }

    fn read(path: Option<&Path>, must_exist: bool) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else if must_exist && path.is_some() {
            Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Config::default())
        }
    }

    /// Apply overrides from an environment-like lookup. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        for (vendor, key_var, url_var) in [
            (Vendor::Cursor, Some("CURSOR_API_KEY"), "CURSOR_API_URL"),
            (Vendor::Scrapybara, Some("SCRAPYBARA_API_KEY"), "SCRAPYBARA_API_URL"),
            (Vendor::Mem0, Some("MEM0_API_KEY"), "MEM0_API_URL"),
            (Vendor::Pipedream, Some("PIPEDREAM_API_KEY"), "PIPEDREAM_API_URL"),
            (Vendor::CopyCapy, None, "COPYCAPY_API_URL"),
        ] {
            let entry = self.vendors.get_mut(vendor);
            if let Some(key) = key_var.and_then(get) {
                entry.api_key = Some(key);
            }
            if let Some(url) = get(url_var) {
                entry.base_url = url;
            }
        }

        if let Some(user) = get("MEM0_USER_ID") {
            self.memory.user_id = user;
        }
        if let Some(url) = get("WEBHOOK_BASE_URL") {
            self.webhook_base_url = Some(url);
        }
        if let Some(mode) = get("GATEHOUSE_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(port) = get("GATEHOUSE_PORT") {
            self.http_port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid GATEHOUSE_PORT: {}", port)))?;
        }

        Ok(())
    }

    /// Save config to `path`, or the default location, without credentials
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(config_path)
    }

    /// Get the default config path
    fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not find home directory".into()))?;
        Ok(home.join(".gatehouse").join("config.toml"))
    }

    /// Path to the registry database
    pub fn registry_db_path(&self) -> PathBuf {
        self.data_dir.join("registry.db")
    }

    /// Callback URL handed to vendors that push events back to us
    pub fn webhook_url(&self, route: &str) -> Option<String> {
        self.webhook_base_url
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), route.trim_start_matches('/')))
    }
}

// Default value functions

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gatehouse")
}

fn default_http_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_workspace_prefix() -> String {
    "/home/scrapybara/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cursor() -> VendorConfig {
    VendorConfig::with_base("https://api.cursor.com")
}

fn default_scrapybara() -> VendorConfig {
    VendorConfig::with_base("https://api.scrapybara.com")
}

fn default_mem0() -> VendorConfig {
    VendorConfig::with_base("https://api.mem0.ai")
}

fn default_pipedream() -> VendorConfig {
    VendorConfig::with_base("https://api.pipedream.com")
}

fn default_copycapy() -> VendorConfig {
    VendorConfig::with_base("https://api.copycapy.com")
}

fn default_persist() -> bool {
    true
}

fn default_install_delay_ms() -> u64 {
    2000
}

fn default_start_delay_ms() -> u64 {
    1000
}

fn default_stop_delay_ms() -> u64 {
    500
}

fn default_search_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

fn default_memory_user() -> String {
    "gatehouse".to_string()
}
