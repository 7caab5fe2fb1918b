//! Catalog service tests over a stubbed snapshot source: pagination math,
//! TTL idempotence, invalidation and failure collapse, with scrape
//! invocations observable through a counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ringdex::{
    Catalog, CatalogService, Category, Config, PageCache, Record, Result, ScrapeError,
    SnapshotSource, page_key,
};

struct StubSource {
    records: Vec<Record>,
    calls: AtomicUsize,
    fail: bool,
}

impl StubSource {
    fn with_records(n: usize) -> Arc<Self> {
        Arc::new(Self {
            records: snapshot(n),
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            records: Vec::new(),
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for StubSource {
    async fn fetch_snapshot(&self) -> Result<Vec<Record>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScrapeError::CategoryExtractionFailed(
                "spirits: reveal control not found within wait window".to_string(),
            ));
        }
        Ok(self.records.clone())
    }
}

fn snapshot(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record {
            display_name: format!("item-{i}"),
            image_url: format!("https://example.org/file/item-{i}.png"),
        })
        .collect()
}

fn service_with(
    source: Arc<StubSource>,
    ttl: Duration,
) -> (CatalogService, Arc<PageCache>) {
    let cache = Arc::new(PageCache::new(100, ttl));
    let service = CatalogService::with_source(Category::Spirits, Arc::clone(&cache), source);
    (service, cache)
}

const TTL: Duration = Duration::from_secs(30 * 60);

#[tokio::test]
async fn forty_five_records_paginate_as_20_20_5_and_empty() {
    let source = StubSource::with_records(45);
    let (service, _cache) = service_with(Arc::clone(&source), TTL);

    let page0 = service.fetch_page(20, 0).await;
    let page1 = service.fetch_page(20, 1).await;
    let page2 = service.fetch_page(20, 2).await;
    assert_eq!(page0.len(), 20);
    assert_eq!(page1.len(), 20);
    assert_eq!(page2.len(), 5);
    // Pages 1 and 2 were filled by the batch write of the first scrape.
    assert_eq!(source.calls(), 1);

    // Past the end: the miss triggers a scrape, but the key stays absent
    // after population, so the result is an empty page.
    let page3 = service.fetch_page(20, 3).await;
    assert!(page3.is_empty());
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn pagination_preserves_snapshot_order() {
    let source = StubSource::with_records(45);
    let (service, _cache) = service_with(source, TTL);

    let page1 = service.fetch_page(20, 1).await;
    assert_eq!(page1[0].display_name, "item-20");
    assert_eq!(page1[19].display_name, "item-39");
}

#[tokio::test]
async fn repeat_fetch_within_ttl_is_served_from_cache() {
    let source = StubSource::with_records(10);
    let (service, _cache) = service_with(Arc::clone(&source), TTL);

    let first = service.fetch_page(20, 0).await;
    let second = service.fetch_page(20, 0).await;
    assert_eq!(first, second);
    assert_eq!(source.calls(), 1, "second fetch must not scrape");
}

#[tokio::test]
async fn one_scrape_populates_every_page_of_the_category() {
    let source = StubSource::with_records(45);
    let (service, cache) = service_with(source, TTL);

    let _ = service.fetch_page(20, 0).await;
    assert_eq!(cache.len(), 3);
    for n in 0..3 {
        assert!(cache.get(&page_key(Category::Spirits, n)).is_some());
    }
}

#[tokio::test]
async fn invalidation_forces_a_fresh_scrape_within_ttl() {
    let source = StubSource::with_records(10);
    let (service, cache) = service_with(Arc::clone(&source), TTL);

    let _ = service.fetch_page(20, 0).await;
    cache.invalidate_all();
    let _ = service.fetch_page(20, 0).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn expired_pages_trigger_a_rescrape() {
    let source = StubSource::with_records(10);
    let (service, _cache) = service_with(Arc::clone(&source), Duration::from_millis(30));

    let _ = service.fetch_page(20, 0).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    let _ = service.fetch_page(20, 0).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn failed_scrape_yields_empty_page_and_cold_cache() {
    let source = StubSource::failing();
    let (service, cache) = service_with(Arc::clone(&source), TTL);

    let page = service.fetch_page(20, 0).await;
    assert!(page.is_empty());
    assert!(cache.is_empty(), "a failed scrape must not populate the cache");

    // The failure is not cached either; the next call retries.
    let _ = service.fetch_page(20, 0).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn empty_snapshot_is_not_cached() {
    let source = StubSource::with_records(0);
    let (service, cache) = service_with(Arc::clone(&source), TTL);

    let page = service.fetch_page(20, 0).await;
    assert!(page.is_empty());
    assert!(cache.is_empty());
    let _ = service.fetch_page(20, 0).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn zero_page_size_short_circuits_without_scraping() {
    let source = StubSource::with_records(10);
    let (service, _cache) = service_with(Arc::clone(&source), TTL);

    let page = service.fetch_page(0, 0).await;
    assert!(page.is_empty());
    assert_eq!(source.calls(), 0);
}

#[test]
fn catalog_invalidation_is_safe_on_a_cold_cache() {
    let catalog = Catalog::new(Config::default());
    catalog.invalidate(Some(Category::Armor));
    catalog.invalidate(None);
}
