use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::category::Category;
use crate::record::Record;

/// Cache key for one page of one category, e.g. `"armor/page/3"`.
pub fn page_key(category: Category, page_number: usize) -> String {
    format!("{}/page/{}", category.as_str(), page_number)
}

struct CacheEntry {
    page: Vec<Record>,
    written: Instant,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    // Front = most recently touched, back = eviction victim.
    recency: VecDeque<String>,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        self.recency.retain(|k| k != key);
        self.recency.push_front(key.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.recency.retain(|k| k != key);
    }
}

/// Shared page cache for every category's catalog service.
///
/// Entries expire a fixed interval after they were written; reads do not
/// refresh the clock. The total entry count is bounded; once the bound
/// would be exceeded the least recently touched entry is evicted. All
/// synchronization is internal, callers need no lock of their own.
pub struct PageCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
    capacity: usize,
}

impl PageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                recency: VecDeque::new(),
            }),
            ttl,
            capacity,
        }
    }

    /// Fetch a page. An entry past its TTL is removed and reported absent.
    pub fn get(&self, key: &str) -> Option<Vec<Record>> {
        let mut inner = self.inner.lock().expect("page cache poisoned");
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.written.elapsed() >= self.ttl,
            None => return None,
        };
        if expired {
            debug!(key, "evicting expired page");
            inner.remove(key);
            return None;
        }
        inner.touch(key);
        inner.entries.get(key).map(|entry| entry.page.clone())
    }

    /// Insert or overwrite a page, evicting the least recently touched
    /// entry if the capacity bound would be exceeded.
    pub fn put(&self, key: String, page: Vec<Record>) {
        let mut inner = self.inner.lock().expect("page cache poisoned");
        while !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            match inner.recency.pop_back() {
                Some(victim) => {
                    debug!(key = %victim, "evicting page over capacity");
                    inner.entries.remove(&victim);
                }
                None => break,
            }
        }
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                page,
                written: Instant::now(),
            },
        );
        inner.touch(&key);
    }

    /// Drop every entry across every category.
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.lock().expect("page cache poisoned");
        inner.entries.clear();
        inner.recency.clear();
    }

    /// Drop every entry whose key starts with `prefix` (one category).
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut inner = self.inner.lock().expect("page cache poisoned");
        inner.entries.retain(|key, _| !key.starts_with(prefix));
        let entries = std::mem::take(&mut inner.recency);
        inner.recency = entries
            .into_iter()
            .filter(|key| !key.starts_with(prefix))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("page cache poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
