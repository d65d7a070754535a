use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::error::InspectorResult;
use crate::executor::QueryExecutor;

type CacheKey = (String, Option<String>);

struct CacheEntry {
    rows: Vec<Value>,
    fetched_at: Instant,
}

/// Process-wide response cache keyed by query text and address.
///
/// Entries are fresh for `ttl`; failures are never cached. Expired entries
/// are swept whenever a new result is stored.
pub struct CachedExecutor<E> {
    inner: E,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl<E> CachedExecutor<E> {
    pub fn new(inner: E, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<Value>> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        (entry.fetched_at.elapsed() < self.ttl).then(|| entry.rows.clone())
    }

    fn store(&self, key: CacheKey, rows: Vec<Value>) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        let swept = before - entries.len();
        if swept > 0 {
            debug!("swept {} expired cache entries", swept);
        }
        entries.insert(
            key,
            CacheEntry {
                rows,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<E: QueryExecutor> QueryExecutor for CachedExecutor<E> {
    async fn execute(&self, sql: &str, address: Option<&str>) -> InspectorResult<Vec<Value>> {
        let key: CacheKey = (sql.to_string(), address.map(str::to_string));
        if let Some(rows) = self.lookup(&key) {
            debug!("cache hit ({} rows)", rows.len());
            return Ok(rows);
        }

        let rows = self.inner.execute(sql, address).await?;
        self.store(key, rows.clone());
        Ok(rows)
    }
}
