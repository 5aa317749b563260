//! Grouping of flat crawl output into product → star bucket → reviews.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::records::{EnrichedReview, FieldValue, ProductRecord};

/// Bucket key for reviews whose rating is missing or out of range.
pub const UNKNOWN_BUCKET: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductEntry {
    pub product_data: ProductRecord,
    pub search_keyword: String,
    pub scraped_at: DateTime<Utc>,
    /// Keys are `"1"`..`"5"` or `"unknown"`; reviews keep crawl order.
    pub reviews: BTreeMap<String, Vec<EnrichedReview>>,
}

impl ProductEntry {
    #[must_use]
    pub fn review_count(&self) -> usize {
        self.reviews.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub total_products: usize,
    pub total_reviews: usize,
    pub star_distribution: BTreeMap<String, usize>,
    pub scraped_at: DateTime<Utc>,
}

/// Products keyed `product_{rank}` in listing order, plus run totals.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizedResult {
    entries: Vec<(String, ProductEntry)>,
    summary: CrawlSummary,
}

impl OrganizedResult {
    #[must_use]
    pub fn entries(&self) -> &[(String, ProductEntry)] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ProductEntry> {
        self.entries
            .iter()
            .find_map(|(k, entry)| (k == key).then_some(entry))
    }

    #[must_use]
    pub fn summary(&self) -> &CrawlSummary {
        &self.summary
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for OrganizedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

/// Star bucket for a review rating such as `"4.0"` or `"4.0 out of 5 stars"`.
///
/// The first numeric token is floored; anything outside 1–5 is `"unknown"`.
#[must_use]
pub fn star_bucket(rating: &FieldValue) -> String {
    let Some(text) = rating.found() else {
        return UNKNOWN_BUCKET.to_string();
    };

    let value = text
        .split_whitespace()
        .find_map(|token| token.replace(',', ".").parse::<f64>().ok());

    match value {
        Some(v) if (1.0..6.0).contains(&v) => {
            // Range-checked above, so the floor fits in a u8.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let star = v.floor() as u8;
            star.to_string()
        }
        _ => UNKNOWN_BUCKET.to_string(),
    }
}

/// Group `reviews` under their products and compute run totals.
///
/// A review is placed under the product with the same `(title, url)` identity,
/// preferring the one with the same rank when identities collide. Reviews
/// that match no product are left out.
#[must_use]
pub fn organize(
    keyword: &str,
    products: &[ProductRecord],
    reviews: &[EnrichedReview],
    scraped_at: DateTime<Utc>,
) -> OrganizedResult {
    let mut entries: Vec<(String, ProductEntry)> = products
        .iter()
        .map(|product| {
            (
                format!("product_{}", product.rank),
                ProductEntry {
                    product_data: product.clone(),
                    search_keyword: keyword.to_string(),
                    scraped_at,
                    reviews: BTreeMap::new(),
                },
            )
        })
        .collect();

    for review in reviews {
        let slot = entries
            .iter()
            .position(|(_, e)| {
                e.product_data.rank == review.product_rank && review.belongs_to(&e.product_data)
            })
            .or_else(|| {
                entries
                    .iter()
                    .position(|(_, e)| review.belongs_to(&e.product_data))
            });

        if let Some(idx) = slot {
            entries[idx]
                .1
                .reviews
                .entry(star_bucket(&review.review.star_rating))
                .or_default()
                .push(review.clone());
        }
    }

    let mut star_distribution = BTreeMap::new();
    for (_, entry) in &entries {
        for (bucket, bucket_reviews) in &entry.reviews {
            *star_distribution.entry(bucket.clone()).or_insert(0) += bucket_reviews.len();
        }
    }

    let summary = CrawlSummary {
        total_products: entries.len(),
        total_reviews: entries.iter().map(|(_, e)| e.review_count()).sum(),
        star_distribution,
        scraped_at,
    };

    OrganizedResult { entries, summary }
}
