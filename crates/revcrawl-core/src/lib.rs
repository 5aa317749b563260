pub mod app_config;
pub mod config;
pub mod error;
pub mod locators;
pub mod organize;
pub mod records;
pub mod site;

pub use app_config::{AppConfig, Credentials, OutputFormat};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use locators::{load_locator_table, Locator, LocatorChain, LocatorScope, LocatorTable};
pub use organize::{organize, star_bucket, CrawlSummary, OrganizedResult, ProductEntry};
pub use records::{EnrichedReview, FieldValue, ProductRecord, ReviewRecord, SENTINEL};
pub use site::SiteProfile;
