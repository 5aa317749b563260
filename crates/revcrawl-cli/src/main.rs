mod crawl;

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use revcrawl_core::{AppConfig, OutputFormat};
use tracing_subscriber::EnvFilter;

use crate::crawl::CrawlOptions;

/// Ratings to collect one at a time, parsed from `4,5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StarFilter(Vec<u8>);

impl StarFilter {
    pub(crate) fn ratings(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for StarFilter {
    type Err = String;

    /// Comma-separated ratings 1–5; duplicates are dropped, first occurrence wins.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ratings = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let star: u8 = part
                .parse()
                .map_err(|_| format!("'{part}' is not a star rating"))?;
            if !(1..=5).contains(&star) {
                return Err(format!("star rating {star} is outside 1-5"));
            }
            if !ratings.contains(&star) {
                ratings.push(star);
            }
        }
        if ratings.is_empty() {
            return Err("expected at least one star rating".to_string());
        }
        Ok(Self(ratings))
    }
}

#[derive(Debug, Parser)]
#[command(name = "revcrawl")]
#[command(about = "Collect product listings and customer reviews for a search keyword")]
struct Cli {
    /// Search keyword, e.g. "wireless mouse"
    keyword: String,

    /// Number of top search results to collect reviews for
    #[arg(long)]
    top_count: Option<usize>,

    /// Comma-separated star ratings to collect separately, e.g. 4,5
    #[arg(long)]
    star_filter: Option<StarFilter>,

    /// Maximum review pages per product and rating
    #[arg(long)]
    max_pages: Option<u32>,

    /// Run the browser without a visible window (true/false)
    #[arg(long)]
    headless: Option<bool>,

    /// Wait for a manual login in the browser window before crawling
    #[arg(long)]
    manual_login: bool,

    /// Sign in with REVCRAWL_EMAIL / REVCRAWL_PASSWORD before crawling
    #[arg(long)]
    login: bool,

    /// Result files to write: json, csv, or both
    #[arg(long)]
    output_format: Option<OutputFormat>,

    /// Directory for result files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// WebDriver server address
    #[arg(long)]
    webdriver_url: Option<String>,
}

impl Cli {
    /// Flags take precedence over environment configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(top_count) = self.top_count {
            config.top_count = top_count;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(headless) = self.headless {
            config.headless = headless;
        }
        if let Some(format) = self.output_format {
            config.output_format = format;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.trim_end_matches('/').to_string();
        }
    }

    fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            keyword: self.keyword.trim().to_string(),
            star_filter: self
                .star_filter
                .as_ref()
                .map(|f| f.ratings().to_vec())
                .unwrap_or_default(),
            manual_login: self.manual_login,
            credential_login: self.login,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = revcrawl_core::load_app_config()?;
    cli.apply_overrides(&mut config);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    crawl::run_crawl(&config, cli.crawl_options()).await
}
