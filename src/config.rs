//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub erp: ErpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Built frontend (index.html + assets)
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpConfig {
    /// Per-call timeout for ERP requests
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where quote snapshots are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Public quote lookup disabled
    #[default]
    None,
    Memory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Required when backend is `redis`
    #[serde(default)]
    pub redis_url: Option<String>,

    /// How long a quote stays retrievable by code
    #[serde(default = "default_quote_ttl")]
    pub quote_ttl_secs: u64,

    /// Prefix of generated quote codes
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_customer_limit")]
    pub customer_limit: usize,

    #[serde(default = "default_product_limit")]
    pub product_limit: usize,

    #[serde(default = "default_order_limit")]
    pub order_limit: usize,

    #[serde(default = "default_ticket_limit")]
    pub ticket_limit: usize,

    #[serde(default = "default_invoice_limit")]
    pub invoice_limit: usize,

    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Ship product thumbnails in dashboard payloads
    #[serde(default = "default_true")]
    pub include_images: bool,
}

// Defaults
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_http_port() -> u16 { 5000 }
fn default_static_dir() -> PathBuf { PathBuf::from("frontend/dist") }
fn default_timeout() -> u64 { 30 }
fn default_quote_ttl() -> u64 { 30 * 24 * 3600 } // 30 days
fn default_code_prefix() -> String { "ASC".to_string() }
fn default_customer_limit() -> usize { 10 }
fn default_product_limit() -> usize { 200 }
fn default_order_limit() -> usize { 100 }
fn default_ticket_limit() -> usize { 50 }
fn default_invoice_limit() -> usize { 50 }
fn default_search_limit() -> usize { 20 }
fn default_true() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::None,
            redis_url: None,
            quote_ttl_secs: default_quote_ttl(),
            code_prefix: default_code_prefix(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            customer_limit: default_customer_limit(),
            product_limit: default_product_limit(),
            order_limit: default_order_limit(),
            ticket_limit: default_ticket_limit(),
            invoice_limit: default_invoice_limit(),
            search_limit: default_search_limit(),
            include_images: true,
        }
    }
}

/// Config file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cache.backend = \"redis\" requires cache.redis_url")]
    MissingRedisUrl,
}

impl Config {
    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            return Err(ConfigError::MissingRedisUrl);
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }
}
