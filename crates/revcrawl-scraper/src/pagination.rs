//! Page-by-page traversal of a review listing.

use revcrawl_core::{LocatorTable, ReviewRecord};

use crate::extract::{find_all_first, find_first_enabled, Lookup};
use crate::pacing::{Interrupt, Pacing};
use crate::page::PageSession;
use crate::records::RecordBuilder;

/// Walker position. Starts at `ScrapingPage(1)` and always ends `Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    ScrapingPage(u32),
    AdvancingPage(u32),
    Exhausted,
}

/// Records gathered by one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    pub reviews: Vec<ReviewRecord>,
    pub pages_scraped: u32,
    pub interrupted: bool,
}

pub struct PaginationWalker<'a> {
    locators: &'a LocatorTable,
    builder: RecordBuilder<'a>,
    pacing: Pacing,
    max_pages: u32,
}

impl<'a> PaginationWalker<'a> {
    /// `max_pages` below one is treated as one.
    #[must_use]
    pub fn new(
        locators: &'a LocatorTable,
        builder: RecordBuilder<'a>,
        pacing: Pacing,
        max_pages: u32,
    ) -> Self {
        Self {
            locators,
            builder,
            pacing,
            max_pages: max_pages.max(1),
        }
    }

    /// Walk from the current page until no enabled "next" control remains or
    /// the page cap is reached. The cap holds even when "next" never disables.
    pub async fn walk<S: PageSession>(&self, session: &mut S, interrupt: &Interrupt) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        let mut state = WalkState::ScrapingPage(1);

        loop {
            state = match state {
                WalkState::ScrapingPage(page) => {
                    if interrupt.is_triggered() {
                        outcome.interrupted = true;
                        WalkState::Exhausted
                    } else {
                        let found = self.scrape_page(session, page).await;
                        outcome.reviews.extend(found);
                        outcome.pages_scraped = page;
                        WalkState::AdvancingPage(page)
                    }
                }
                WalkState::AdvancingPage(page) => self.advance(session, page).await,
                WalkState::Exhausted => break,
            };
        }

        outcome
    }

    async fn scrape_page<S: PageSession>(&self, session: &mut S, page: u32) -> Vec<ReviewRecord> {
        let elements = find_all_first(session, &self.locators.review_elements, None).await;
        if elements.is_empty() {
            tracing::info!(page, "no reviews on page");
            return Vec::new();
        }

        let mut reviews = Vec::with_capacity(elements.len());
        for element in &elements {
            reviews.push(self.builder.build_review(session, element).await);
        }
        tracing::info!(page, count = reviews.len(), "reviews scraped");
        reviews
    }

    async fn advance<S: PageSession>(&self, session: &mut S, page: u32) -> WalkState {
        if page >= self.max_pages {
            tracing::debug!(page, max_pages = self.max_pages, "page cap reached");
            return WalkState::Exhausted;
        }

        let Lookup::Hit(next) = find_first_enabled(session, &self.locators.next_page).await else {
            tracing::debug!(page, "no enabled next control");
            return WalkState::Exhausted;
        };

        if let Err(e) = session.click(&next).await {
            tracing::warn!(page, error = %e, "next page click failed");
            return WalkState::Exhausted;
        }
        self.pacing.settle().await;
        WalkState::ScrapingPage(page + 1)
    }
}

/// Click the filter control for `star`. Returns `false` when no enabled
/// control exists or the click fails.
pub async fn apply_star_filter<S: PageSession>(
    session: &mut S,
    locators: &LocatorTable,
    pacing: &Pacing,
    star: u8,
) -> bool {
    let chain = locators.star_filter_for(star);
    let Lookup::Hit(control) = find_first_enabled(session, &chain).await else {
        tracing::warn!(star, "star filter control not found");
        return false;
    };

    match session.click(&control).await {
        Ok(()) => {
            pacing.settle_filter().await;
            tracing::debug!(star, "star filter applied");
            true
        }
        Err(e) => {
            tracing::warn!(star, error = %e, "star filter click failed");
            false
        }
    }
}
