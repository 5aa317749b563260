//! Field and record extraction against captured listing markup.

mod common;

use revcrawl_core::{FieldValue, LocatorChain, LocatorTable, SENTINEL};
use revcrawl_scraper::{
    extract_field, extract_numeric_field, extract_product_url, PageSession, RecordBuilder,
    SnapshotSession,
};

use common::{search_page, search_result, site, Product};

const PAGE: &str = "https://www.amazon.com/s?k=fixture";

async fn loaded(html: &str) -> SnapshotSession {
    let site = site();
    let mut session = common::session(&site).with_page(PAGE, html);
    session.navigate(PAGE).await.unwrap();
    session
}

#[tokio::test]
async fn field_missing_from_every_locator_is_sentinel() {
    let mut session = loaded("<div><p>nothing here</p></div>").await;
    let chain = LocatorChain::css("missing", &[".nope", "#also-nope", "span.absent"]);

    let value = extract_field(&mut session, None, &chain).await;
    assert_eq!(value, FieldValue::Missing);
    assert_eq!(value.as_str(), SENTINEL);
}

#[tokio::test]
async fn field_text_is_trimmed() {
    let mut session = loaded("<h2>\n    Ergonomic   Mouse \t</h2>").await;
    let chain = LocatorChain::css("title", &["h2"]);

    let value = extract_field(&mut session, None, &chain).await;
    assert_eq!(value.as_str(), "Ergonomic Mouse");
}

#[tokio::test]
async fn blank_hit_falls_through_to_next_locator() {
    let mut session = loaded("<span class='a'>   </span><span class='b'>Fallback</span>").await;
    let chain = LocatorChain::css("title", &["span.a", "span.b"]);

    let value = extract_field(&mut session, None, &chain).await;
    assert_eq!(value.as_str(), "Fallback");
}

#[tokio::test]
async fn invalid_selector_is_skipped_not_fatal() {
    let mut session = loaded("<span class='ok'>value</span>").await;
    let chain = LocatorChain::css("title", &["span[[[", "span.ok"]);

    let value = extract_field(&mut session, None, &chain).await;
    assert_eq!(value.as_str(), "value");
}

#[tokio::test]
async fn repeated_extraction_yields_identical_values() {
    let html = search_page(&[search_result(&Product {
        id: "B0STABLE01",
        title: "Stable Mouse",
        price: "$9.99",
    })]);
    let mut session = loaded(&html).await;
    let table = LocatorTable::default();

    let first = extract_field(&mut session, None, &table.product_price).await;
    let second = extract_field(&mut session, None, &table.product_price).await;
    assert_eq!(first, second);
    assert_eq!(first.as_str(), "$9.99");
}

#[tokio::test]
async fn numeric_field_reads_aria_label_when_text_has_no_digit() {
    let mut session =
        loaded("<i class='a-icon-star' aria-label='3.5 out of 5 stars'><span></span></i>").await;
    let chain = LocatorChain::css("rating", &[".a-icon-star"]);

    let value = extract_numeric_field(&mut session, None, &chain).await;
    assert_eq!(value.as_str(), "3.5 out of 5 stars");
}

#[tokio::test]
async fn numeric_field_skips_hits_without_digits() {
    let mut session =
        loaded("<span class='first'>No rating</span><span class='second'>4.2 stars</span>").await;
    let chain = LocatorChain::css("rating", &[".first", ".second"]);

    let value = extract_numeric_field(&mut session, None, &chain).await;
    assert_eq!(value.as_str(), "4.2 stars");
}

#[tokio::test]
async fn sponsored_product_url_is_unwrapped() {
    let html = "<div data-component-type='s-search-result'>\
        <h2><a href='/sspa/click?ie=UTF8&amp;spc=MToxMjM&amp;url=%2FSponsored-Mouse%2Fdp%2FB0SPONSOR1%2Fref%3Dsr_1_1_sspa'>\
        <span>Sponsored Mouse</span></a></h2></div>";
    let mut session = loaded(html).await;
    let site = site();
    let table = LocatorTable::default();

    let value = extract_product_url(&mut session, None, &table.product_url, &site).await;
    assert_eq!(
        value.as_str(),
        "https://www.amazon.com/Sponsored-Mouse/dp/B0SPONSOR1/ref=sr_1_1_sspa"
    );
    assert_eq!(
        site.product_id(value.as_str()).as_deref(),
        Some("B0SPONSOR1")
    );
}

#[tokio::test]
async fn product_url_without_product_link_is_missing() {
    let mut session = loaded("<div><a href='/stores/brand'>Visit the store</a></div>").await;
    let site = site();
    let table = LocatorTable::default();

    let value = extract_product_url(&mut session, None, &table.product_url, &site).await;
    assert!(value.is_missing());
}

#[tokio::test]
async fn product_records_take_listing_order_and_rank() {
    let html = search_page(&[
        search_result(&Product {
            id: "B0FIRST001",
            title: "First Mouse",
            price: "$19.99",
        }),
        search_result(&Product {
            id: "B0SECOND01",
            title: "Second Mouse",
            price: "$24.50",
        }),
    ]);
    let mut session = loaded(&html).await;
    let site = site();
    let table = LocatorTable::default();
    let builder = RecordBuilder::new(&table, &site);

    let elements = session
        .find_all(&table.product_results.locators()[0], None)
        .await
        .unwrap();
    assert_eq!(elements.len(), 2);

    let second = builder.build_product(&mut session, &elements[1], 2).await;
    assert_eq!(second.rank, 2);
    assert_eq!(second.title.as_str(), "Second Mouse");
    assert_eq!(second.price.as_str(), "$24.50");
    assert_eq!(second.rating.as_str(), "4.5 out of 5 stars");
    assert_eq!(
        second.url.as_str(),
        "https://www.amazon.com/Second-Mouse/dp/B0SECOND01/ref=sr_1_1?keywords=test"
    );
}

#[tokio::test]
async fn review_record_fields_are_extracted() {
    let html = common::reviews_page(
        &[common::review("R1", 4, "Solid buy", "Clicks feel great.", "Dana")],
        &common::Next::None,
        &[],
    );
    let mut session = loaded(&html).await;
    let site = site();
    let table = LocatorTable::default();
    let builder = RecordBuilder::new(&table, &site);

    let elements = session
        .find_all(&table.review_elements.locators()[0], None)
        .await
        .unwrap();
    let review = builder.build_review(&mut session, &elements[0]).await;

    assert_eq!(review.title.as_str(), "Solid buy");
    assert_eq!(review.text.as_str(), "Clicks feel great.");
    assert_eq!(review.star_rating.as_str(), "4.0");
    assert_eq!(review.reviewer_name.as_str(), "Dana");
    assert_eq!(
        review.date.as_str(),
        "Reviewed in the United States on May 1, 2024"
    );
}

#[tokio::test]
async fn review_without_optional_fields_uses_sentinels() {
    let html = "<div data-hook='review'><span data-hook='review-body'>Just text</span></div>";
    let mut session = loaded(html).await;
    let site = site();
    let table = LocatorTable::default();
    let builder = RecordBuilder::new(&table, &site);

    let elements = session
        .find_all(&table.review_elements.locators()[0], None)
        .await
        .unwrap();
    let review = builder.build_review(&mut session, &elements[0]).await;

    assert_eq!(review.text.as_str(), "Just text");
    assert_eq!(review.title.as_str(), SENTINEL);
    assert_eq!(review.star_rating.as_str(), SENTINEL);
    assert_eq!(review.reviewer_name.as_str(), SENTINEL);
    assert_eq!(review.date.as_str(), SENTINEL);
}
