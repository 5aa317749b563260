use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser command {operation} failed: {reason}")]
    Driver { operation: String, reason: String },

    #[error("webdriver at {url} is unavailable: {reason}")]
    DriverUnavailable { url: String, reason: String },

    #[error("invalid locator \"{selector}\": {reason}")]
    InvalidLocator { selector: String, reason: String },

    #[error("failed to access cookie file {path}: {source}")]
    CookieIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed cookie file {path}: {source}")]
    CookieParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no product identifier in URL \"{url}\"")]
    InvalidProductUrl { url: String },

    #[error("reviews page unreachable for product {product_id} after {attempts} address variants")]
    PageUnreachable { product_id: String, attempts: usize },
}

impl ScraperError {
    pub(crate) fn driver(operation: &str, reason: impl std::fmt::Display) -> Self {
        ScraperError::Driver {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for errors that mean the browser session itself is gone.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScraperError::DriverUnavailable { .. })
    }
}
