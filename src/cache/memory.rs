//! In-process quote store

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::{CacheError, QuoteSnapshot, QuoteStore};

pub struct MemoryQuoteStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, (QuoteSnapshot, Instant)>>,
}

impl MemoryQuoteStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn put(&self, quote: &QuoteSnapshot) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        // Sweep expired entries on write
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(quote.code.clone(), (quote.clone(), now + self.ttl));
        Ok(())
    }

    async fn get(&self, code: &str) -> Result<Option<QuoteSnapshot>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(code)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(quote, _)| quote.clone()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QuoteLine;

    fn snapshot(code: &str) -> QuoteSnapshot {
        QuoteSnapshot {
            code: code.to_string(),
            order_id: 12,
            order_name: "S00012".to_string(),
            customer: "Walk-in".to_string(),
            phone: None,
            date: "2026-10-15".to_string(),
            lines: vec![QuoteLine {
                name: "Oak Chair".to_string(),
                qty: 2.0,
                price: 50.0,
                total: 100.0,
            }],
            untaxed: 100.0,
            tax: 20.0,
            total: 120.0,
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryQuoteStore::new(Duration::from_secs(60));
        store.put(&snapshot("ASC-1")).await.unwrap();

        let found = store.get("ASC-1").await.unwrap();
        assert_eq!(found, Some(snapshot("ASC-1")));
        assert!(store.get("ASC-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_not_returned() {
        let store = MemoryQuoteStore::new(Duration::ZERO);
        store.put(&snapshot("ASC-1")).await.unwrap();

        assert!(store.get("ASC-1").await.unwrap().is_none());

        // The next write sweeps the stale entry
        store.put(&snapshot("ASC-2")).await.unwrap();
        assert_eq!(store.entries.read().await.len(), 1);
    }
}
