//! Console summary of a finished run.

use revcrawl_core::{ProductRecord, SENTINEL};

use super::pipeline::RunReport;

pub(super) fn print_products(products: &[ProductRecord]) {
    if products.is_empty() {
        println!("no products found");
        return;
    }
    println!("found {} products:", products.len());
    for product in products {
        println!("  {}. {}", product.rank, product.title);
        println!("     price:  {}", product.price);
        println!("     rating: {}", product.rating);
        println!("     url:    {}", product.url);
    }
}

pub(super) fn print_report(report: &RunReport) {
    print_products(&report.outcome.products);

    for (key, entry) in report.organized.entries() {
        println!(
            "{key}: {} reviews for {}",
            entry.review_count(),
            entry.product_data.title
        );
    }

    for skipped in &report.outcome.skipped {
        println!("skipped product {}: {}", skipped.rank, skipped.reason);
    }

    let summary = report.organized.summary();
    println!();
    println!(
        "total: {} products, {} reviews",
        summary.total_products, summary.total_reviews
    );
    if summary.star_distribution.is_empty() {
        println!("star distribution: {SENTINEL}");
    } else {
        println!("{:<10}REVIEWS", "STARS");
        for (bucket, count) in &summary.star_distribution {
            println!("{bucket:<10}{count}");
        }
    }

    match &report.saved {
        None => println!("crawl interrupted; no files written"),
        Some(saved) => {
            for path in saved.written() {
                println!("saved {}", path.display());
            }
            for failure in &saved.failures {
                println!("not saved: {failure}");
            }
        }
    }
}
