use std::time::Duration;

/// Tunables for the scrape-and-paginate core.
///
/// Constructed once and shared by the catalog services; nothing here is
/// global state. Every knob has a default matching the reference behavior
/// and an environment override for deployment tweaking.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin serving the wiki pages. Category paths are appended to this.
    pub base_url: String,
    /// How long a cached page stays valid after it is written.
    pub page_ttl: Duration,
    /// Upper bound on cached pages across all categories combined.
    pub cache_capacity: usize,
    /// Bounded wait for a reveal control or content anchor to appear.
    pub element_wait: Duration,
    /// Fixed delay after triggering a tab reveal; the rendered DOM lags the
    /// click.
    pub reveal_settle: Duration,
    /// chromedriver binary to spawn. Resolved through PATH when relative.
    pub chromedriver: String,
    /// How long to wait for the spawned driver to accept connections.
    pub driver_start_timeout: Duration,
    /// Browser viewport, fixed so layout-dependent visibility is stable.
    pub window_size: (u32, u32),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://eldenring.wiki.fextralife.com".to_string(),
            page_ttl: Duration::from_secs(30 * 60),
            cache_capacity: 100,
            element_wait: Duration::from_secs(10),
            reveal_settle: Duration::from_millis(1000),
            chromedriver: "chromedriver".to_string(),
            driver_start_timeout: Duration::from_millis(12_000),
            window_size: (1920, 1080),
        }
    }
}

impl Config {
    /// Defaults overridden by `RINGDEX_*` environment variables where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("RINGDEX_BASE_URL") {
            if !base_url.is_empty() {
                config.base_url = base_url.trim_end_matches('/').to_string();
            }
        }
        if let Some(secs) = env_u64("RINGDEX_PAGE_TTL_SECS") {
            config.page_ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = env_u64("RINGDEX_CACHE_CAPACITY") {
            config.cache_capacity = capacity as usize;
        }
        if let Some(ms) = env_u64("RINGDEX_ELEMENT_WAIT_MS") {
            config.element_wait = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("RINGDEX_REVEAL_SETTLE_MS") {
            config.reveal_settle = Duration::from_millis(ms);
        }
        if let Ok(bin) = std::env::var("RINGDEX_CHROMEDRIVER") {
            if !bin.is_empty() {
                config.chromedriver = bin;
            }
        }
        if let Some(ms) = env_u64("RINGDEX_DRIVER_START_TIMEOUT_MS") {
            config.driver_start_timeout = Duration::from_millis(ms);
        }
        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = Config::default();
        assert_eq!(config.page_ttl, Duration::from_secs(1800));
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.element_wait, Duration::from_secs(10));
        assert_eq!(config.window_size, (1920, 1080));
    }
}
