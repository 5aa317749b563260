use std::path::Path;
use std::time::Duration;

use revcrawl_output::FileSink;
use revcrawl_scraper::{CookieStore, LoginSettings, SessionEffect, SnapshotSession};
use tempfile::tempdir;

use super::*;

const KEYWORD: &str = "wireless mouse";

const SIGNED_IN: &str = "<span>Hello, Dana</span><span>Account &amp; Lists</span>";
const ANONYMOUS: &str = "<a href='/ap/signin'>Sign in</a>";

const RESULT: &str = "<div data-component-type='s-search-result' data-asin='B0MOUSE001'>\
    <h2><a href='/Wireless-Mouse/dp/B0MOUSE001/ref=sr_1_1'><span>Wireless Mouse</span></a></h2>\
    <span class='a-price'><span class='a-offscreen'>$19.99</span></span>\
    <i class='a-icon a-icon-star-small'><span class='a-icon-alt'>4.4 out of 5 stars</span></i>\
    </div>";

fn review(n: usize, stars: u8) -> String {
    format!(
        "<div data-hook='review'>\
           <span class='a-profile-name'>Reviewer {n}</span>\
           <a data-hook='review-title'><i data-hook='review-star-rating'>\
             <span class='a-icon-alt'>{stars}.0 out of 5 stars</span></i><span>Title {n}</span></a>\
           <span data-hook='review-date'>Reviewed on May {n}, 2024</span>\
           <span data-hook='review-body'><span>Body {n}</span></span>\
         </div>"
    )
}

struct Fixture {
    site: SiteProfile,
    locators: LocatorTable,
    guard: SessionGuard,
    interrupt: Interrupt,
}

impl Fixture {
    fn new(cookie_path: &Path) -> Self {
        let site = SiteProfile::default();
        let locators = LocatorTable::default();
        let guard = SessionGuard::new(
            site.clone(),
            CookieStore::new(cookie_path),
            LoginSettings {
                interactive: false,
                timeout: Duration::ZERO,
                poll_interval: Duration::ZERO,
                credentials: None,
            },
            locators.clone(),
            Pacing::immediate(),
        );
        Self {
            site,
            locators,
            guard,
            interrupt: Interrupt::new(),
        }
    }

    fn pipeline(&self) -> Pipeline<'_> {
        Pipeline {
            site: &self.site,
            locators: &self.locators,
            guard: &self.guard,
            pacing: Pacing::immediate(),
            interrupt: self.interrupt.clone(),
        }
    }

    fn session(&self, search_results: &str) -> SnapshotSession {
        SnapshotSession::new(&self.site.login_url)
            .with_account_page(&self.site.account_url, SIGNED_IN, ANONYMOUS)
            .with_page(
                &self.site.search_url(KEYWORD),
                &format!("<html><body>{search_results}</body></html>"),
            )
    }
}

fn options(output_dir: &Path, top_count: usize) -> PipelineOptions {
    PipelineOptions {
        request: CrawlRequest {
            keyword: KEYWORD.to_string(),
            top_count,
            star_filter: Vec::new(),
            max_pages: 1,
        },
        manual_login: false,
        credentials: None,
        output_format: OutputFormat::Both,
        output_dir: output_dir.to_path_buf(),
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn zero_products_still_writes_both_files() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::new(&dir.path().join("cookies.json"));
    let mut session = fixture.session("").signed_in();
    let out = dir.path().join("output");

    let report = run_pipeline(&mut session, &fixture.pipeline(), &options(&out, 2), &FileSink)
        .await
        .expect("zero products is not an error");

    assert!(report.outcome.products.is_empty());
    assert!(report.outcome.reviews.is_empty());
    assert_eq!(report.organized.summary().total_products, 0);
    assert_eq!(report.organized.summary().total_reviews, 0);

    let saved = report.saved.expect("files are written for an empty run");
    assert!(saved.failures.is_empty());
    let json = read_json(saved.json.as_deref().unwrap());
    assert_eq!(json["summary"]["total_reviews"], 0);
    let csv = std::fs::read_to_string(saved.csv.as_deref().unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 1, "header only");
}

#[tokio::test]
async fn collected_reviews_are_saved_under_their_product() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::new(&dir.path().join("cookies.json"));
    let reviews: String = (1..=5).map(|n| review(n, 5)).collect();
    let landing = fixture.site.review_url_variants("B0MOUSE001")[0].clone();
    let mut session = fixture
        .session(RESULT)
        .signed_in()
        .with_page(&landing, &format!("<html><body>{reviews}</body></html>"));

    let report = run_pipeline(
        &mut session,
        &fixture.pipeline(),
        &options(dir.path(), 3),
        &FileSink,
    )
    .await
    .unwrap();

    assert_eq!(report.outcome.products.len(), 1);
    assert_eq!(report.organized.summary().total_reviews, 5);

    let saved = report.saved.unwrap();
    let json = read_json(saved.json.as_deref().unwrap());
    let product = &json["products"]["product_1"];
    assert_eq!(product["product_data"]["price"], "$19.99");
    assert_eq!(product["reviews"]["5"].as_array().unwrap().len(), 5);
    assert_eq!(product["reviews"]["5"][0]["product_title"], "Wireless Mouse");

    let csv = std::fs::read_to_string(saved.csv.as_deref().unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 6);
}

#[tokio::test]
async fn interrupted_run_is_reported_but_not_saved() {
    let dir = tempdir().unwrap();
    let fixture = Fixture::new(&dir.path().join("cookies.json"));
    let mut session = fixture.session(RESULT).signed_in();
    let out = dir.path().join("output");
    fixture.interrupt.trigger();

    let report = run_pipeline(&mut session, &fixture.pipeline(), &options(&out, 3), &FileSink)
        .await
        .unwrap();

    assert!(report.outcome.interrupted);
    assert_eq!(report.organized.summary().total_products, 1);
    assert!(report.saved.is_none());
    assert!(!out.exists());
}

#[tokio::test]
async fn credential_login_runs_before_the_search() {
    let dir = tempdir().unwrap();
    let cookie_path = dir.path().join("cookies.json");
    let fixture = Fixture::new(&cookie_path);
    let password_page = "https://www.amazon.com/ap/signin/password";
    let home = "https://www.amazon.com/?ref_=nav_ya";
    let mut session = fixture
        .session("")
        .with_page(
            &fixture.site.login_url,
            &format!(
                "<form><input id='ap_email' type='email'>\
                 <input id='continue' type='submit' data-href='{password_page}'></form>"
            ),
        )
        .with_page(
            password_page,
            &format!(
                "<form><input id='ap_password' type='password'>\
                 <input id='signInSubmit' type='submit' data-href='{home}'></form>"
            ),
        )
        .with_page(home, SIGNED_IN)
        .with_visit_effect(home, SessionEffect::SignIn);
    let run = PipelineOptions {
        credentials: Some(Credentials {
            email: "shopper@example.com".to_string(),
            password: "hunter22".to_string(),
        }),
        ..options(dir.path(), 3)
    };

    run_pipeline(&mut session, &fixture.pipeline(), &run, &FileSink)
        .await
        .unwrap();

    assert!(session.is_signed_in());
    assert!(cookie_path.exists());
    let search = fixture.site.search_url(KEYWORD);
    let visits = session.visits();
    let login_at = visits.iter().position(|v| *v == fixture.site.login_url);
    let search_at = visits.iter().position(|v| *v == search);
    assert!(login_at.is_some(), "visits: {visits:?}");
    assert!(login_at < search_at, "visits: {visits:?}");
}
