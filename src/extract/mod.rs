//! Category extraction: one declarative plan per catalog category, executed
//! by a single engine against a live browser session, with the DOM harvest
//! running over the rendered snapshot.

mod plans;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::browser::BrowserSession;
use crate::category::Category;
use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::record::{Record, collapse_whitespace, normalize};

pub(crate) use plans::plan_for;

/// Capability interface for a category's extraction strategy.
#[async_trait]
pub trait CategoryScraper: Send + Sync {
    /// Navigate the session to the category's page, surface its gallery and
    /// return every record in document order.
    async fn scrape(&self, session: &BrowserSession, base_url: &str) -> Result<Vec<Record>>;
}

/// Look up the production scraper for a category.
pub fn scraper_for(category: Category, config: &Config) -> Arc<dyn CategoryScraper> {
    Arc::new(PlanScraper {
        category,
        plan: plan_for(category),
        settle: config.reveal_settle,
    })
}

/// Declarative description of how one category's page is surfaced and
/// harvested. The plans live in a static table; the engine below is the
/// only consumer.
pub(crate) struct ExtractPlan {
    /// URL suffix appended to the wiki origin.
    pub path: &'static str,
    /// XPath locating a tab/accordion control by its visible label. The
    /// control must appear within the bounded wait and is then clicked.
    pub reveal: Option<&'static str>,
    /// CSS anchor that must be present before harvesting.
    pub ready: Option<&'static str>,
    /// Whether to pause before harvesting; reveal rendering lags the click.
    pub settle: bool,
    /// Category-specific DOM pass over the rendered snapshot.
    pub harvest: fn(&Html, &str) -> Vec<Record>,
}

struct PlanScraper {
    category: Category,
    plan: &'static ExtractPlan,
    settle: Duration,
}

#[async_trait]
impl CategoryScraper for PlanScraper {
    async fn scrape(&self, session: &BrowserSession, base_url: &str) -> Result<Vec<Record>> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), self.plan.path);
        info!(category = %self.category, url, "starting scrape");
        session.navigate(&url).await?;

        if let Some(reveal) = self.plan.reveal {
            if !session.wait_for_xpath(reveal).await? {
                return Err(ScrapeError::CategoryExtractionFailed(format!(
                    "{}: reveal control not found within wait window",
                    self.category
                )));
            }
            // Some category pages render their gallery without the click;
            // a control that vanished between probe and click is not fatal.
            if !session.click_xpath(reveal).await? {
                warn!(category = %self.category, "reveal control vanished before click");
            }
        }

        if self.plan.settle {
            tokio::time::sleep(self.settle).await;
        }

        if let Some(ready) = self.plan.ready {
            if !session.wait_for_css(ready).await? {
                return Err(ScrapeError::CategoryExtractionFailed(format!(
                    "{}: content container not found within wait window",
                    self.category
                )));
            }
        }

        let html = session.html().await?;
        let doc = Html::parse_document(&html);
        let records = (self.plan.harvest)(&doc, base_url);
        info!(category = %self.category, count = records.len(), "scrape finished");
        Ok(records)
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}

/// All text under the element, whitespace-collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first matching descendant with non-empty content.
fn first_text(el: ElementRef<'_>, selector: &str) -> String {
    let Some(sel) = parse_selector(selector) else {
        return String::new();
    };
    for found in el.select(&sel) {
        let text = element_text(found);
        if !text.is_empty() {
            return text;
        }
    }
    String::new()
}

/// Image reference of the first `img` under the element. Gallery images are
/// lazy-loaded, so the deferred `data-src` wins over the eager `src` unless
/// the plan says otherwise.
fn image_ref(el: ElementRef<'_>, prefer_eager: bool) -> String {
    let Some(img) = first_image(el) else {
        return String::new();
    };
    let deferred = img.value().attr("data-src").unwrap_or("").trim();
    let eager = img.value().attr("src").unwrap_or("").trim();
    let (first, second) = if prefer_eager {
        (eager, deferred)
    } else {
        (deferred, eager)
    };
    if !first.is_empty() {
        first.to_string()
    } else {
        second.to_string()
    }
}

/// `title` attribute of the first `img` under the element.
fn image_title(el: ElementRef<'_>) -> String {
    first_image(el)
        .and_then(|img| img.value().attr("title"))
        .map(collapse_whitespace)
        .unwrap_or_default()
}

fn first_image<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let sel = parse_selector("img")?;
    el.select(&sel).next()
}

/// Funnel every candidate through the normalizer; incomplete ones are
/// skipped here and never abort the surrounding category pass.
fn push_candidate(
    records: &mut Vec<Record>,
    category: &'static str,
    name: &str,
    image: &str,
    base_url: &str,
) {
    match normalize(name, image, base_url) {
        Some(record) => records.push(record),
        None => debug!(category, "skipping candidate with missing name or image"),
    }
}
