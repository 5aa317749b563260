//! Login steps, crawl, organize, and persist, over any [`PageSession`].

use std::path::PathBuf;

use chrono::Utc;
use revcrawl_core::{
    organize, Credentials, LocatorTable, OrganizedResult, OutputFormat, SiteProfile,
};
use revcrawl_output::{save_results, ResultSink, SavedFiles};
use revcrawl_scraper::{
    CrawlOutcome, CrawlRequest, Crawler, Interrupt, Pacing, PageSession, SessionGuard,
};

/// Shared collaborators for one run.
pub(crate) struct Pipeline<'a> {
    pub site: &'a SiteProfile,
    pub locators: &'a LocatorTable,
    pub guard: &'a SessionGuard,
    pub pacing: Pacing,
    pub interrupt: Interrupt,
}

#[derive(Debug, Clone)]
pub(crate) struct PipelineOptions {
    pub request: CrawlRequest,
    /// Wait for a human login before crawling.
    pub manual_login: bool,
    /// Submit the sign-in form before crawling.
    pub credentials: Option<Credentials>,
    pub output_format: OutputFormat,
    pub output_dir: PathBuf,
}

#[derive(Debug)]
pub(crate) struct RunReport {
    pub outcome: CrawlOutcome,
    pub organized: OrganizedResult,
    /// `None` when the run was interrupted and nothing was written.
    pub saved: Option<SavedFiles>,
}

/// Run the crawl and write its results.
///
/// Login failures and per-product failures degrade the run without failing
/// it. An interrupted run is organized and reported but not persisted.
///
/// # Errors
///
/// Returns an error only if the search page cannot be loaded.
pub(crate) async fn run_pipeline<S, K>(
    session: &mut S,
    pipeline: &Pipeline<'_>,
    options: &PipelineOptions,
    sink: &K,
) -> anyhow::Result<RunReport>
where
    S: PageSession,
    K: ResultSink,
{
    if let Some(credentials) = &options.credentials {
        if !pipeline
            .guard
            .login_with_credentials(session, credentials)
            .await
        {
            tracing::warn!("credential login failed; continuing with saved session state");
        }
    }

    if options.manual_login && !pipeline.guard.interactive_login(session).await {
        tracing::warn!("manual login did not complete; continuing");
    }

    let crawler = Crawler::new(
        pipeline.site,
        pipeline.locators,
        pipeline.guard,
        pipeline.pacing,
        pipeline.interrupt.clone(),
    );
    let outcome = crawler.crawl(session, &options.request).await?;

    let run_at = Utc::now();
    let organized = organize(
        &options.request.keyword,
        &outcome.products,
        &outcome.reviews,
        run_at,
    );

    let saved = if outcome.interrupted {
        tracing::warn!("run interrupted; results not saved");
        None
    } else {
        Some(save_results(
            sink,
            &organized,
            &options.request.keyword,
            options.output_format,
            &options.output_dir,
            run_at,
        ))
    };

    Ok(RunReport {
        outcome,
        organized,
        saved,
    })
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
