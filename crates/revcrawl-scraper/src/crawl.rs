//! Search → per-product session check → review walks → aggregation.

use revcrawl_core::{EnrichedReview, LocatorTable, ProductRecord, ReviewRecord, SiteProfile};

use crate::error::ScraperError;
use crate::extract::find_all_first;
use crate::pacing::{Interrupt, Pacing};
use crate::page::PageSession;
use crate::pagination::{apply_star_filter, PaginationWalker};
use crate::records::RecordBuilder;
use crate::session_guard::SessionGuard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub keyword: String,
    pub top_count: usize,
    /// Ratings to walk one at a time, in this order. Empty walks unfiltered.
    pub star_filter: Vec<u8>,
    pub max_pages: u32,
}

/// A product whose reviews were not collected, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedProduct {
    pub rank: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Listing order.
    pub products: Vec<ProductRecord>,
    /// Product order, then facet order, then page and in-page order.
    pub reviews: Vec<EnrichedReview>,
    pub skipped: Vec<SkippedProduct>,
    pub interrupted: bool,
}

struct ProductReviews {
    reviews: Vec<ReviewRecord>,
    interrupted: bool,
}

pub struct Crawler<'a> {
    site: &'a SiteProfile,
    locators: &'a LocatorTable,
    guard: &'a SessionGuard,
    pacing: Pacing,
    interrupt: Interrupt,
}

impl<'a> Crawler<'a> {
    #[must_use]
    pub fn new(
        site: &'a SiteProfile,
        locators: &'a LocatorTable,
        guard: &'a SessionGuard,
        pacing: Pacing,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            site,
            locators,
            guard,
            pacing,
            interrupt,
        }
    }

    fn builder(&self) -> RecordBuilder<'a> {
        RecordBuilder::new(self.locators, self.site)
    }

    /// Run a full crawl for `request`.
    ///
    /// Per-product failures are logged and recorded in
    /// [`CrawlOutcome::skipped`]; they never abort the crawl. An interrupt
    /// stops the crawl at the next product, facet, or page boundary and
    /// returns what was collected so far.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] only when the search page itself cannot be loaded.
    pub async fn crawl<S: PageSession>(
        &self,
        session: &mut S,
        request: &CrawlRequest,
    ) -> Result<CrawlOutcome, ScraperError> {
        let products = self
            .search_products(session, &request.keyword, request.top_count)
            .await?;

        let mut outcome = CrawlOutcome {
            products,
            ..CrawlOutcome::default()
        };

        if outcome.products.is_empty() {
            tracing::warn!(keyword = %request.keyword, "no products found");
            return Ok(outcome);
        }

        for product in &outcome.products {
            if self.interrupt.is_triggered() {
                outcome.interrupted = true;
                break;
            }

            tracing::info!(rank = product.rank, title = %product.title, "collecting reviews");
            match self.product_reviews(session, product, request).await {
                Ok(collected) => {
                    tracing::info!(
                        rank = product.rank,
                        count = collected.reviews.len(),
                        "product reviews collected"
                    );
                    outcome.reviews.extend(
                        collected
                            .reviews
                            .into_iter()
                            .map(|review| review.enrich(product)),
                    );
                    if collected.interrupted {
                        outcome.interrupted = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(rank = product.rank, error = %e, "skipping product reviews");
                    outcome.skipped.push(SkippedProduct {
                        rank: product.rank,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Load the search results for `keyword` and build up to `top_count`
    /// products in listing order.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if navigation to the search page fails.
    pub async fn search_products<S: PageSession>(
        &self,
        session: &mut S,
        keyword: &str,
        top_count: usize,
    ) -> Result<Vec<ProductRecord>, ScraperError> {
        let url = self.site.search_url(keyword);
        tracing::info!(%url, "searching");
        session.navigate(&url).await?;
        self.pacing.settle().await;

        let elements = find_all_first(session, &self.locators.product_results, None).await;
        let builder = self.builder();

        let mut products = Vec::new();
        for (rank, element) in (1u32..).zip(elements.iter().take(top_count)) {
            products.push(builder.build_product(session, element, rank).await);
        }

        tracing::info!(found = elements.len(), kept = products.len(), "search results parsed");
        Ok(products)
    }

    async fn product_reviews<S: PageSession>(
        &self,
        session: &mut S,
        product: &ProductRecord,
        request: &CrawlRequest,
    ) -> Result<ProductReviews, ScraperError> {
        let url = product.url.as_str();
        let product_id = product
            .url
            .found()
            .and_then(|u| self.site.product_id(u))
            .ok_or_else(|| ScraperError::InvalidProductUrl {
                url: url.to_string(),
            })?;

        let authenticated = self.guard.ensure_authenticated(session).await;
        if !authenticated {
            tracing::warn!(rank = product.rank, "proceeding without an authenticated session");
        }

        self.pacing.random_delay().await;
        let landing = self
            .open_reviews_page(session, &product_id, authenticated)
            .await?;

        let walker =
            PaginationWalker::new(self.locators, self.builder(), self.pacing, request.max_pages);

        if request.star_filter.is_empty() {
            let walk = walker.walk(session, &self.interrupt).await;
            return Ok(ProductReviews {
                reviews: walk.reviews,
                interrupted: walk.interrupted,
            });
        }

        let mut collected = ProductReviews {
            reviews: Vec::new(),
            interrupted: false,
        };
        for (idx, &star) in request.star_filter.iter().enumerate() {
            if self.interrupt.is_triggered() {
                collected.interrupted = true;
                break;
            }

            if idx > 0 {
                if let Err(e) = session.navigate(&landing).await {
                    tracing::warn!(star, error = %e, "could not return to reviews page");
                    continue;
                }
                self.pacing.settle().await;
            }

            if !apply_star_filter(session, self.locators, &self.pacing, star).await {
                continue;
            }

            let walk = walker.walk(session, &self.interrupt).await;
            tracing::debug!(
                star,
                count = walk.reviews.len(),
                pages = walk.pages_scraped,
                "facet walked"
            );
            collected.reviews.extend(walk.reviews);
            if walk.interrupted {
                collected.interrupted = true;
                break;
            }
        }

        Ok(collected)
    }

    /// Try each reviews address variant in turn and return the address of the
    /// first accepted landing.
    ///
    /// A sign-in redirect gets one recovery attempt and a retry of the same
    /// variant, unless `may_recover` is false because recovery already failed
    /// for this product. Once recovery has failed it is not attempted again
    /// for later variants.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::PageUnreachable`] when no variant lands on a
    /// reviews listing.
    pub async fn open_reviews_page<S: PageSession>(
        &self,
        session: &mut S,
        product_id: &str,
        may_recover: bool,
    ) -> Result<String, ScraperError> {
        let variants = self.site.review_url_variants(product_id);
        let mut recovery_failed = !may_recover;

        for url in &variants {
            let mut retried = false;
            loop {
                if let Err(e) = session.navigate(url).await {
                    tracing::warn!(%url, error = %e, "reviews navigation failed");
                    break;
                }
                self.pacing.settle().await;

                let address = session.current_address().await.unwrap_or_default();
                if self.site.is_reviews_address(&address) {
                    tracing::debug!(%address, "reviews page reached");
                    return Ok(address);
                }

                if self.site.is_signin_address(&address) && !retried && !recovery_failed {
                    tracing::warn!(%url, "redirected to sign-in; recovering session");
                    retried = true;
                    if self.guard.ensure_authenticated(session).await {
                        continue;
                    }
                    recovery_failed = true;
                }

                tracing::debug!(%url, %address, "reviews variant rejected");
                break;
            }
        }

        Err(ScraperError::PageUnreachable {
            product_id: product_id.to_string(),
            attempts: variants.len(),
        })
    }
}
