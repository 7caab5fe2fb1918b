use thiserror::Error;

/// Failures raised by the scraping pipeline.
///
/// Everything below the category level (a single bad gallery tile, a stale
/// node) is skipped and logged where it happens and never becomes an error;
/// these variants cover the attempt-fatal cases. The catalog service
/// collapses all of them to an empty page at its boundary.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The chromedriver process could not be spawned or never became ready.
    #[error("browser unavailable: {0}")]
    BrowserUnavailable(String),

    /// A category's reveal control or root content container did not appear
    /// within the bounded wait window.
    #[error("category extraction failed: {0}")]
    CategoryExtractionFailed(String),

    /// WebDriver wire failure below the category level: session create,
    /// navigate, script execution or snapshot transport.
    #[error("webdriver protocol: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
