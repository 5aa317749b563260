//! Product and review record construction from located elements.

use revcrawl_core::{LocatorTable, ProductRecord, ReviewRecord, SiteProfile};

use crate::extract::{
    extract_field, extract_numeric_field, extract_product_url, leading_number,
};
use crate::page::PageSession;

/// Composes field extraction into whole records using one locator table.
#[derive(Debug, Clone, Copy)]
pub struct RecordBuilder<'a> {
    locators: &'a LocatorTable,
    site: &'a SiteProfile,
}

impl<'a> RecordBuilder<'a> {
    #[must_use]
    pub fn new(locators: &'a LocatorTable, site: &'a SiteProfile) -> Self {
        Self { locators, site }
    }

    pub async fn build_product<S: PageSession>(
        &self,
        session: &mut S,
        element: &S::Element,
        rank: u32,
    ) -> ProductRecord {
        let scope = Some(element);
        let t = self.locators;
        ProductRecord {
            rank,
            title: extract_field(session, scope, &t.product_title).await,
            price: extract_field(session, scope, &t.product_price).await,
            rating: extract_numeric_field(session, scope, &t.product_rating).await,
            url: extract_product_url(session, scope, &t.product_url, self.site).await,
        }
    }

    /// Review record; the star rating keeps only its leading number (`"4.0"`).
    pub async fn build_review<S: PageSession>(
        &self,
        session: &mut S,
        element: &S::Element,
    ) -> ReviewRecord {
        let scope = Some(element);
        let t = self.locators;
        let rating = extract_numeric_field(session, scope, &t.review_rating).await;
        ReviewRecord {
            text: extract_field(session, scope, &t.review_text).await,
            star_rating: leading_number(&rating),
            date: extract_field(session, scope, &t.review_date).await,
            reviewer_name: extract_field(session, scope, &t.reviewer_name).await,
            title: extract_field(session, scope, &t.review_title).await,
        }
    }
}
