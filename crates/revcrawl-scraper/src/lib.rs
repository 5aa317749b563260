pub mod cookies;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod pacing;
pub mod page;
pub mod pagination;
pub mod records;
pub mod session_guard;
#[cfg(feature = "snapshot")]
pub mod snapshot;
pub mod webdriver;

pub use cookies::CookieStore;
pub use crawl::{CrawlOutcome, CrawlRequest, Crawler, SkippedProduct};
pub use error::ScraperError;
pub use extract::{extract_field, extract_numeric_field, extract_product_url, Lookup};
pub use pacing::{Interrupt, Pacing};
pub use page::{PageSession, StoredCookie};
pub use pagination::{apply_star_filter, PaginationWalker, WalkOutcome, WalkState};
pub use records::RecordBuilder;
pub use session_guard::{is_authenticated_view, LoginSettings, SessionGuard};
#[cfg(feature = "snapshot")]
pub use snapshot::{SessionEffect, SnapshotElement, SnapshotSession};
pub use webdriver::{probe_webdriver, BrowserOptions, WebDriverSession};
