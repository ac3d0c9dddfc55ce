//! Quote cache
//!
//! Created quotes get a short public code. The printable snapshot is kept in
//! a key-value store so anyone holding the code (e.g. from a QR on the printout)
//! can fetch it without ERP credentials.
//!
//! Backends:
//! - `redis`: shared across instances, TTL via `SETEX`
//! - `memory`: process-local, for single-instance or development setups

pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{CacheBackend, CacheConfig};

pub use memory::MemoryQuoteStore;
pub use redis_store::RedisQuoteStore;

/// Printable summary of a created quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub code: String,
    pub order_id: i64,
    pub order_name: String,
    pub customer: String,
    pub phone: Option<String>,
    pub date: String,
    pub lines: Vec<QuoteLine>,
    pub untaxed: f64,
    pub tax: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub name: String,
    pub qty: f64,
    pub price: f64,
    pub total: f64,
}

/// Cache errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Storage for quote snapshots keyed by public code
#[async_trait::async_trait]
pub trait QuoteStore: Send + Sync {
    async fn put(&self, quote: &QuoteSnapshot) -> Result<(), CacheError>;

    async fn get(&self, code: &str) -> Result<Option<QuoteSnapshot>, CacheError>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}

/// Short, human-typable quote code
pub fn generate_code(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, id[..8].to_uppercase())
}

/// Open the configured store.
///
/// A Redis backend that cannot be reached is logged and disables public
/// lookup; the rest of the gateway keeps working without it.
pub async fn from_config(config: &CacheConfig) -> Option<Arc<dyn QuoteStore>> {
    let ttl = Duration::from_secs(config.quote_ttl_secs);

    let store: Arc<dyn QuoteStore> = match config.backend {
        CacheBackend::None => return None,
        CacheBackend::Memory => Arc::new(MemoryQuoteStore::new(ttl)),
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref()?;
            match RedisQuoteStore::connect(url, ttl).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!(error = %e, "Quote cache unavailable, public lookup disabled");
                    return None;
                }
            }
        }
    };

    info!(
        backend = store.backend(),
        ttl_secs = config.quote_ttl_secs,
        "Quote cache ready"
    );
    Some(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        let code = generate_code("ASC");
        assert!(code.starts_with("ASC-"));
        assert_eq!(code.len(), 12);
        assert!(code[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(code, generate_code("ASC"));
    }

    #[tokio::test]
    async fn test_from_config_backends() {
        let mut config = CacheConfig::default();
        assert!(from_config(&config).await.is_none());

        config.backend = CacheBackend::Memory;
        let store = from_config(&config).await.unwrap();
        assert_eq!(store.backend(), "memory");

        config.backend = CacheBackend::Redis;
        config.redis_url = Some("not a url".to_string());
        assert!(from_config(&config).await.is_none());
    }
}
