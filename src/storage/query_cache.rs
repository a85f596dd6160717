use super::Table;
use crate::core::{Clause, Result};
use crate::result::QueryResult;
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::debug;

/// Filter part of the key for an unfiltered select.
const NO_FILTER: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    snapshot: String,
    filter: String,
}

impl CacheKey {
    fn new(table: &Table, filter: Option<&Clause>) -> Result<Self> {
        let snapshot = serde_json::to_string(table)?;
        let filter = match filter {
            Some(clause) => serde_json::to_string(clause)?,
            None => NO_FILTER.to_string(),
        };
        Ok(Self { snapshot, filter })
    }
}

/// Memoized select results keyed by (table snapshot, filter).
///
/// Any mutation changes the snapshot and therefore the key, so entries never
/// go stale and are never invalidated. Unbounded unless a capacity is given,
/// in which case the least recently used entry is evicted.
pub struct QueryCache {
    entries: LruCache<CacheKey, QueryResult>,
    hits: u64,
    misses: u64,
}

impl QueryCache {
    pub fn unbounded() -> Self {
        Self {
            entries: LruCache::unbounded(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// `None` or zero means unbounded.
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => Self::with_capacity(capacity),
            None => Self::unbounded(),
        }
    }

    /// Return the cached result for this table content and filter, running
    /// the select on a miss. Errors are not cached.
    pub fn select(&mut self, table: &Table, filter: Option<&Clause>) -> Result<QueryResult> {
        let key = CacheKey::new(table, filter)?;

        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            debug!(filter = %key.filter, "query cache hit");
            return Ok(hit.clone());
        }

        self.misses += 1;
        debug!(filter = %key.filter, "query cache miss");
        let result = table.select(filter)?;
        self.entries.put(key, result.clone());
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::unbounded()
    }
}
