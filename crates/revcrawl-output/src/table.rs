//! Flattened one-row-per-review view of an organized result.

use std::io::Write;

use revcrawl_core::OrganizedResult;

pub const COLUMNS: [&str; 11] = [
    "product_rank",
    "product_title",
    "product_url",
    "product_price",
    "product_rating",
    "star_bucket",
    "review_title",
    "star_rating",
    "review_date",
    "reviewer_name",
    "review_text",
];

/// Rows in product order, then star bucket order, then crawl order.
#[must_use]
pub fn review_rows(result: &OrganizedResult) -> Vec<[String; 11]> {
    let mut rows = Vec::new();
    for (_, entry) in result.entries() {
        let product = &entry.product_data;
        for (bucket, reviews) in &entry.reviews {
            for enriched in reviews {
                let review = &enriched.review;
                rows.push([
                    product.rank.to_string(),
                    product.title.to_string(),
                    product.url.to_string(),
                    product.price.to_string(),
                    product.rating.to_string(),
                    bucket.clone(),
                    review.title.to_string(),
                    review.star_rating.to_string(),
                    review.date.to_string(),
                    review.reviewer_name.to_string(),
                    review.text.to_string(),
                ]);
            }
        }
    }
    rows
}

/// Header plus one record per review; an empty result still gets the header.
///
/// # Errors
///
/// Returns [`csv::Error`] if a record cannot be written or flushed.
pub fn write_rows<W: Write>(writer: W, result: &OrganizedResult) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(COLUMNS)?;
    for row in review_rows(result) {
        out.write_record(&row)?;
    }
    out.flush()?;
    Ok(())
}
