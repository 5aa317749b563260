//! Addresses and page markers describing the storefront being crawled.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::app_config::AppConfig;

/// Characters escaped in the sign-in `return_to` parameter.
const RETURN_TO: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'-').remove(b'_');

/// Sign-in query parameters after `return_to`, which depends on the base URL.
const SIGNIN_QUERY: &str = "openid.identity=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0%2Fidentifier_select\
    &openid.assoc_handle=usflex&openid.mode=checkid_setup\
    &openid.claimed_id=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0%2Fidentifier_select\
    &openid.ns=http%3A%2F%2Fspecs.openid.net%2Fauth%2F2.0";

/// Lowercase substrings that only appear on pages rendered for a signed-in shopper.
pub const DEFAULT_LOGIN_INDICATORS: [&str; 5] =
    ["hello,", "your account", "account & lists", "orders", "prime"];

/// Lowercase substrings of the anonymous greeting, which also contains "hello,".
pub const DEFAULT_ANONYMOUS_INDICATORS: [&str; 2] = ["hello, sign in", "hello, sign-in"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub base_url: String,
    /// Page used for "am I logged in" checks and as the cookie injection origin.
    pub account_url: String,
    pub login_url: String,
    /// Address fragment that identifies an accepted reviews listing.
    pub reviews_marker: String,
    /// Address fragment that identifies a sign-in redirect.
    pub signin_marker: String,
    /// Path fragments that precede a product identifier, in priority order.
    pub product_markers: Vec<String>,
    pub login_indicators: Vec<String>,
    /// Substrings that veto the login indicators.
    pub anonymous_indicators: Vec<String>,
}

impl SiteProfile {
    #[must_use]
    pub fn for_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            account_url: format!("{base_url}/"),
            login_url: signin_url(&base_url),
            reviews_marker: "product-reviews".to_string(),
            signin_marker: "signin".to_string(),
            product_markers: vec!["/dp/".to_string(), "/gp/product/".to_string()],
            login_indicators: DEFAULT_LOGIN_INDICATORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            anonymous_indicators: DEFAULT_ANONYMOUS_INDICATORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            base_url,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::for_base_url(&config.base_url)
    }

    /// Search results address for `keyword`, spaces joined with `+`.
    #[must_use]
    pub fn search_url(&self, keyword: &str) -> String {
        let query = keyword
            .split_whitespace()
            .map(|word| utf8_percent_encode(word, NON_ALPHANUMERIC).to_string())
            .collect::<Vec<_>>()
            .join("+");
        format!("{}/s?k={query}", self.base_url)
    }

    /// Returns `true` when `address` contains one of the product path markers.
    #[must_use]
    pub fn is_product_address(&self, address: &str) -> bool {
        self.product_markers.iter().any(|m| address.contains(m.as_str()))
    }

    /// Product identifier following the first matching product marker, cut at
    /// the next path, query, or fragment separator.
    #[must_use]
    pub fn product_id(&self, product_url: &str) -> Option<String> {
        self.product_markers.iter().find_map(|marker| {
            let (_, rest) = product_url.split_once(marker.as_str())?;
            let id = rest
                .split(['/', '?', '#'])
                .next()
                .unwrap_or_default()
                .trim();
            (!id.is_empty()).then(|| id.to_string())
        })
    }

    /// Reviews listing addresses for `product_id`, in the order they are tried.
    #[must_use]
    pub fn review_url_variants(&self, product_id: &str) -> [String; 4] {
        let listing = format!("{}/product-reviews/{product_id}", self.base_url);
        let show_all = format!("{listing}/ref=cm_cr_dp_d_show_all_btm");
        [
            show_all.clone(),
            format!("{listing}/"),
            format!("{show_all}?ie=UTF8&reviewerType=all_reviews"),
            format!("{show_all}?ie=UTF8&reviewerType=all_reviews&sortBy=recent"),
        ]
    }

    /// Returns `true` when `address` is a reviews listing rather than a redirect.
    #[must_use]
    pub fn is_reviews_address(&self, address: &str) -> bool {
        address.contains(self.reviews_marker.as_str()) && !self.is_signin_address(address)
    }

    #[must_use]
    pub fn is_signin_address(&self, address: &str) -> bool {
        address
            .to_lowercase()
            .contains(self.signin_marker.as_str())
    }
}

/// Sign-in page that returns to the storefront home page of `base_url`.
fn signin_url(base_url: &str) -> String {
    let home = format!("{base_url}/?ref_=nav_custrec_signin");
    let return_to = utf8_percent_encode(&home, RETURN_TO);
    format!(
        "{base_url}/ap/signin?openid.pape.max_auth_age=0&openid.return_to={return_to}&{SIGNIN_QUERY}"
    )
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::for_base_url("https://www.amazon.com")
    }
}
