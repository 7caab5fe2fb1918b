use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::browser::BrowserSession;
use crate::cache::{PageCache, page_key};
use crate::category::Category;
use crate::config::Config;
use crate::error::Result;
use crate::extract::{CategoryScraper, scraper_for};
use crate::record::Record;

/// Produces one full category snapshot per call. The production source
/// drives a browser; tests substitute a counting stub.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Vec<Record>>;
}

/// Scrapes the category through a browser session acquired for this call
/// alone and released on every exit path.
struct BrowserSource {
    scraper: Arc<dyn CategoryScraper>,
    config: Arc<Config>,
}

#[async_trait]
impl SnapshotSource for BrowserSource {
    async fn fetch_snapshot(&self) -> Result<Vec<Record>> {
        let session = BrowserSession::acquire(&self.config).await?;
        let result = self.scraper.scrape(&session, &self.config.base_url).await;
        session.release().await;
        result
    }
}

/// Paginated read access to one category.
///
/// A cache miss triggers a full-category scrape; the snapshot is chunked
/// into fixed-size pages and every page is written to the shared cache, so
/// one scrape serves the whole category's pagination for the TTL window.
pub struct CatalogService {
    category: Category,
    source: Arc<dyn SnapshotSource>,
    cache: Arc<PageCache>,
}

impl CatalogService {
    pub fn new(category: Category, cache: Arc<PageCache>, config: Arc<Config>) -> Self {
        let source = Arc::new(BrowserSource {
            scraper: scraper_for(category, &config),
            config,
        });
        Self {
            category,
            source,
            cache,
        }
    }

    /// Service with a substitute snapshot source; the seam the tests use.
    pub fn with_source(
        category: Category,
        cache: Arc<PageCache>,
        source: Arc<dyn SnapshotSource>,
    ) -> Self {
        Self {
            category,
            source,
            cache,
        }
    }

    /// Fetch one page of the category, scraping on a cache miss.
    ///
    /// Never fails toward the consumer: scrape errors and empty snapshots
    /// collapse to an empty page, and nothing is cached in that case so the
    /// next call retries. An out-of-range page number also yields an empty
    /// page.
    pub async fn fetch_page(&self, page_size: usize, page_number: usize) -> Vec<Record> {
        if page_size == 0 {
            return Vec::new();
        }

        let key = page_key(self.category, page_number);
        if let Some(page) = self.cache.get(&key) {
            debug!(category = %self.category, page_number, "cache hit");
            return page;
        }

        info!(category = %self.category, page_number, "cache miss, scraping category");
        let snapshot = match self.source.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(category = %self.category, "scrape failed: {e}");
                return Vec::new();
            }
        };
        if snapshot.is_empty() {
            // Not cached: a transient empty scrape must not poison the TTL
            // window.
            warn!(category = %self.category, "scrape produced no records");
            return Vec::new();
        }

        let total_items = snapshot.len();
        let pages = chunk_pages(snapshot, page_size);
        info!(
            category = %self.category,
            total_items,
            total_pages = pages.len(),
            page_size,
            "caching category pages"
        );
        for (number, page) in pages.into_iter().enumerate() {
            self.cache.put(page_key(self.category, number), page);
        }

        self.cache.get(&key).unwrap_or_default()
    }
}

/// Split a snapshot into consecutive pages of `page_size`; the last page
/// may be shorter.
pub(crate) fn chunk_pages(records: Vec<Record>, page_size: usize) -> Vec<Vec<Record>> {
    let mut pages = Vec::with_capacity(records.len().div_ceil(page_size));
    let mut rest = records;
    while rest.len() > page_size {
        let tail = rest.split_off(page_size);
        pages.push(rest);
        rest = tail;
    }
    if !rest.is_empty() {
        pages.push(rest);
    }
    pages
}

/// Composition root: the shared page cache plus one catalog service per
/// category. The sole entry point for consumers.
pub struct Catalog {
    cache: Arc<PageCache>,
    services: HashMap<Category, CatalogService>,
}

impl Catalog {
    pub fn new(config: Config) -> Self {
        let cache = Arc::new(PageCache::new(config.cache_capacity, config.page_ttl));
        let config = Arc::new(config);
        let services = Category::ALL
            .into_iter()
            .map(|category| {
                (
                    category,
                    CatalogService::new(category, Arc::clone(&cache), Arc::clone(&config)),
                )
            })
            .collect();
        Self { cache, services }
    }

    pub async fn fetch_page(
        &self,
        category: Category,
        page_size: usize,
        page_number: usize,
    ) -> Vec<Record> {
        self.services
            .get(&category)
            .expect("service registered for every category")
            .fetch_page(page_size, page_number)
            .await
    }

    /// Force fresh scraping: drop one category's cached pages, or all of
    /// them.
    pub fn invalidate(&self, category: Option<Category>) {
        match category {
            Some(category) => {
                info!(%category, "invalidating cached pages");
                self.cache
                    .invalidate_prefix(&format!("{}/", category.as_str()));
            }
            None => {
                info!("invalidating entire page cache");
                self.cache.invalidate_all();
            }
        }
    }
}
