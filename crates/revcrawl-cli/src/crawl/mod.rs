//! The `revcrawl <keyword>` command: browser setup, the crawl pipeline, and
//! teardown.
//!
//! The browser session is closed on every path out of [`run_crawl`] once it
//! has been created, including pipeline errors.

mod pipeline;
mod report;

use std::time::Duration;

use revcrawl_core::{load_locator_table, AppConfig, LocatorTable, SiteProfile};
use revcrawl_output::FileSink;
use revcrawl_scraper::{
    probe_webdriver, BrowserOptions, CookieStore, CrawlRequest, Interrupt, LoginSettings,
    Pacing, PageSession, SessionGuard, WebDriverSession,
};

use pipeline::{run_pipeline, Pipeline, PipelineOptions};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-invocation choices that are not part of [`AppConfig`].
#[derive(Debug, Clone)]
pub(crate) struct CrawlOptions {
    pub keyword: String,
    pub star_filter: Vec<u8>,
    pub manual_login: bool,
    pub credential_login: bool,
}

/// Guard settings for this run. A human can only log in through a visible
/// window, so the interactive wait is offered when not headless or when a
/// manual login was explicitly requested.
pub(crate) fn login_settings(config: &AppConfig, options: &CrawlOptions) -> LoginSettings {
    LoginSettings {
        interactive: !config.headless || options.manual_login,
        timeout: Duration::from_secs(config.login_timeout_secs),
        poll_interval: Duration::from_secs(config.login_poll_secs),
        credentials: config.credentials.clone(),
    }
}

fn load_locators(config: &AppConfig) -> anyhow::Result<LocatorTable> {
    match &config.locators_path {
        Some(path) => {
            let table = load_locator_table(path)?;
            tracing::info!(path = %path.display(), "locator table loaded");
            Ok(table)
        }
        None => Ok(LocatorTable::default()),
    }
}

/// Run a full crawl against a live WebDriver session.
///
/// # Errors
///
/// Returns an error if the keyword is blank, credential login is requested
/// without credentials, the locator file is invalid, the WebDriver server is
/// unavailable, or the search page cannot be loaded.
pub(crate) async fn run_crawl(config: &AppConfig, options: CrawlOptions) -> anyhow::Result<()> {
    if options.keyword.is_empty() {
        anyhow::bail!("search keyword must not be empty");
    }
    if options.credential_login && config.credentials.is_none() {
        anyhow::bail!("--login requires REVCRAWL_EMAIL and REVCRAWL_PASSWORD to be set");
    }

    let locators = load_locators(config)?;
    let site = SiteProfile::from_config(config);
    let pacing = Pacing::from_config(config);
    let guard = SessionGuard::new(
        site.clone(),
        CookieStore::new(&config.cookie_path),
        login_settings(config, &options),
        locators.clone(),
        pacing,
    );

    let browser = BrowserOptions::from_config(config);
    probe_webdriver(&browser.webdriver_url, PROBE_TIMEOUT).await?;
    let mut session = WebDriverSession::connect(&browser).await?;

    let interrupt = Interrupt::new();
    let watcher = spawn_interrupt_watcher(interrupt.clone());

    let pipeline = Pipeline {
        site: &site,
        locators: &locators,
        guard: &guard,
        pacing,
        interrupt,
    };
    let run_options = PipelineOptions {
        request: CrawlRequest {
            keyword: options.keyword.clone(),
            top_count: config.top_count,
            star_filter: options.star_filter.clone(),
            max_pages: config.max_pages,
        },
        manual_login: options.manual_login,
        credentials: if options.credential_login {
            config.credentials.clone()
        } else {
            None
        },
        output_format: config.output_format,
        output_dir: config.output_dir.clone(),
    };

    let result = run_pipeline(&mut session, &pipeline, &run_options, &FileSink).await;

    watcher.abort();
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }

    let report = result?;
    report::print_report(&report);
    Ok(())
}

fn spawn_interrupt_watcher(interrupt: Interrupt) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping at the next boundary");
            interrupt.trigger();
        }
    })
}
