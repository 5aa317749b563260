//! Storefront markup builders shared by the offline crawl tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use revcrawl_core::{LocatorTable, SiteProfile};
use revcrawl_scraper::{
    CookieStore, Interrupt, LoginSettings, Pacing, SessionGuard, SnapshotSession, StoredCookie,
};

pub const ACCOUNT_SIGNED_IN: &str = "<html><body><header>\
    <span id=\"nav-link-accountList-nav-line-1\">Hello, Dana</span>\
    <span>Account &amp; Lists</span></header></body></html>";

pub const ACCOUNT_ANONYMOUS: &str = "<html><body><header>\
    <a href=\"/ap/signin\"><span>Sign in</span></a></header></body></html>";

pub struct Product<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub price: &'a str,
}

pub fn site() -> SiteProfile {
    SiteProfile::default()
}

/// Session whose account page reflects the auth cookie.
pub fn session(site: &SiteProfile) -> SnapshotSession {
    SnapshotSession::new(&site.login_url).with_account_page(
        &site.account_url,
        ACCOUNT_SIGNED_IN,
        ACCOUNT_ANONYMOUS,
    )
}

pub fn login_settings(interactive: bool) -> LoginSettings {
    LoginSettings {
        interactive,
        timeout: Duration::ZERO,
        poll_interval: Duration::ZERO,
        credentials: None,
    }
}

pub fn guard(site: &SiteProfile, cookie_path: &Path, login: LoginSettings) -> SessionGuard {
    SessionGuard::new(
        site.clone(),
        CookieStore::new(cookie_path),
        login,
        LocatorTable::default(),
        Pacing::immediate(),
    )
}

pub fn interrupt() -> Interrupt {
    Interrupt::new()
}

/// Persist a cookie set that signs the snapshot session in.
pub fn write_auth_cookies(path: &Path) {
    let mut cookie = StoredCookie::new("session-token", "restored");
    cookie.domain = Some(".amazon.com".to_string());
    CookieStore::new(path)
        .save(&[cookie])
        .expect("cookie fixture should be writable");
}

pub fn search_result(product: &Product<'_>) -> String {
    format!(
        "<div data-component-type=\"s-search-result\" data-asin=\"{id}\">\
           <h2><a class=\"a-link-normal\" href=\"/{slug}/dp/{id}/ref=sr_1_1?keywords=test\">\
             <span>{title}</span></a></h2>\
           <span class=\"a-price\"><span class=\"a-offscreen\">{price}</span>\
             <span aria-hidden=\"true\">{price}</span></span>\
           <i class=\"a-icon a-icon-star-small\"><span class=\"a-icon-alt\">4.5 out of 5 stars</span></i>\
         </div>",
        id = product.id,
        slug = product.title.replace(' ', "-"),
        title = product.title,
        price = product.price,
    )
}

pub fn search_page(results: &[String]) -> String {
    format!(
        "<html><body><div class=\"s-main-slot\">{}</div></body></html>",
        results.concat()
    )
}

pub fn review(id: &str, stars: u8, title: &str, body: &str, author: &str) -> String {
    format!(
        "<div data-hook=\"review\" id=\"{id}\" class=\"a-section review\">\
           <div data-hook=\"genome-widget\"><span class=\"a-profile-name\">{author}</span></div>\
           <a data-hook=\"review-title\" href=\"/gp/customer-reviews/{id}\">\
             <i data-hook=\"review-star-rating\" class=\"a-icon a-icon-star\">\
               <span class=\"a-icon-alt\">{stars}.0 out of 5 stars</span></i>\
             <span class=\"a-letter-space\"></span>\
             <span>{title}</span></a>\
           <span data-hook=\"review-date\">Reviewed in the United States on May 1, 2024</span>\
           <span data-hook=\"review-body\"><span>{body}</span></span>\
         </div>"
    )
}

/// `count` reviews with distinct ids derived from `prefix`.
pub fn reviews(prefix: &str, stars: u8, count: usize) -> Vec<String> {
    (1..=count)
        .map(|n| {
            review(
                &format!("{prefix}{n}"),
                stars,
                &format!("Title {n}"),
                &format!("Review body {n} for {prefix}"),
                &format!("Reviewer {n}"),
            )
        })
        .collect()
}

pub enum Next<'a> {
    None,
    Enabled(&'a str),
    Disabled,
}

/// Star filter links to render, as `(star, href)` pairs.
pub fn reviews_page(items: &[String], next: &Next<'_>, filters: &[(u8, &str)]) -> String {
    let filter_links: String = filters
        .iter()
        .map(|(star, href)| {
            format!("<a data-hook=\"review-star-filter-{star}\" href=\"{href}\">{star} star</a>")
        })
        .collect();
    let pagination = match next {
        Next::None => String::new(),
        Next::Enabled(href) => format!(
            "<ul class=\"a-pagination\"><li class=\"a-normal\"><a href=\"#\">1</a></li>\
             <li class=\"a-last\"><a href=\"{href}\">Next page</a></li></ul>"
        ),
        Next::Disabled => "<ul class=\"a-pagination\">\
             <li class=\"a-disabled a-last\">Next page</li></ul>"
            .to_string(),
    };
    format!(
        "<html><body><div id=\"cm_cr-review_list\">{filter_links}{}</div>{pagination}</body></html>",
        items.concat()
    )
}

/// First reviews address variant for `product_id`.
pub fn landing(site: &SiteProfile, product_id: &str) -> String {
    site.review_url_variants(product_id)[0].clone()
}
