//! Redis-backed quote store
//!
//! One string key per quote (`quote:{code}`) holding the JSON snapshot,
//! expiring after the configured TTL.

use std::time::Duration;

use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::debug;

use super::{CacheError, QuoteSnapshot, QuoteStore};

const KEY_PREFIX: &str = "quote:";

pub struct RedisQuoteStore {
    connection: ConnectionManager,
    ttl: Duration,
}

impl RedisQuoteStore {
    pub async fn connect(redis_url: &str, ttl: Duration) -> Result<Self, CacheError> {
        let client = Client::open(redis_url).map_err(|e| CacheError::Connection(e.to_string()))?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self { connection, ttl })
    }

    fn key(code: &str) -> String {
        format!("{}{}", KEY_PREFIX, code)
    }
}

#[async_trait::async_trait]
impl QuoteStore for RedisQuoteStore {
    async fn put(&self, quote: &QuoteSnapshot) -> Result<(), CacheError> {
        let payload =
            serde_json::to_string(quote).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(Self::key(&quote.code), payload, self.ttl.as_secs().max(1))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        debug!(code = %quote.code, "Quote cached");
        Ok(())
    }

    async fn get(&self, code: &str) -> Result<Option<QuoteSnapshot>, CacheError> {
        let mut connection = self.connection.clone();
        let payload: Option<String> = connection
            .get(Self::key(code))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(|e| CacheError::Serialization(e.to_string())))
            .transpose()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix() {
        assert_eq!(RedisQuoteStore::key("ASC-1A2B3C4D"), "quote:ASC-1A2B3C4D");
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = RedisQuoteStore::connect("not-a-redis-url", Duration::from_secs(60)).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }
}
