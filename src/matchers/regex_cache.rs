use ahash::RandomState;
use papaya::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use super::match_handlers::StringMatchHandler;
use super::regex_utils::compile_match_handler;

/// Compiled regex matchers keyed by pattern.
///
/// Safe for concurrent lookup and insert. Entries are never evicted; once
/// `max_entries` patterns are cached, further patterns are compiled on every use.
pub struct RegexCache {
    requests: AtomicU64,
    misses: AtomicU64,
    inner: HashMap<String, Arc<StringMatchHandler>, RandomState>,
    max_entries: usize,
    size_limit: usize,
}

impl RegexCache {
    pub fn new(max_entries: usize, size_limit: usize) -> Self {
        Self {
            requests: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inner: HashMap::with_hasher(RandomState::new()),
            max_entries,
            size_limit,
        }
    }

    /// Returns the matcher for `pattern`, compiling it on a miss. Compilation errors
    /// are not cached.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<StringMatchHandler>, String> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let map = self.inner.pin();
        if let Some(handler) = map.get(pattern) {
            return Ok(handler.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(pattern, "regex cache miss");

        let handler = Arc::new(compile_match_handler(pattern, self.size_limit)?);
        if map.len() < self.max_entries {
            map.insert(pattern.to_string(), handler.clone());
        }
        Ok(handler)
    }

    /// Returns the number of cached patterns.
    pub fn len(&self) -> usize {
        self.inner.pin().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
