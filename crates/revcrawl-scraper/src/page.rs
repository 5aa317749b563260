//! The rendered-page capability every crawl step drives.

use revcrawl_core::Locator;
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// One browser cookie in the JSON shape WebDriver returns and the cookie file stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// Unix timestamp in seconds; `None` for session cookies.
    #[serde(default, alias = "expires", skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl StoredCookie {
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: None,
            path: None,
            secure: None,
            http_only: None,
            expiry: None,
            same_site: None,
        }
    }
}

/// A live, rendered browsing session.
///
/// There is exactly one session per run and every call goes through `&mut self`:
/// navigation, lookups and clicks all act on the same current page. Element
/// handles are only meaningful until the next navigation.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    type Element: Clone;

    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError>;

    async fn reload(&mut self) -> Result<(), ScraperError>;

    async fn current_address(&mut self) -> Result<String, ScraperError>;

    /// Full markup of the current page.
    async fn current_content(&mut self) -> Result<String, ScraperError>;

    async fn run_script(&mut self, source: &str) -> Result<serde_json::Value, ScraperError>;

    /// First element matching `locator`, searched beneath `scope` unless the
    /// locator is document-scoped or no scope is given.
    async fn find_one(
        &mut self,
        locator: &Locator,
        scope: Option<&Self::Element>,
    ) -> Result<Option<Self::Element>, ScraperError>;

    async fn find_all(
        &mut self,
        locator: &Locator,
        scope: Option<&Self::Element>,
    ) -> Result<Vec<Self::Element>, ScraperError>;

    /// Rendered text of the element.
    async fn text(&mut self, element: &Self::Element) -> Result<String, ScraperError>;

    /// Attribute or DOM property value (`textContent` included).
    async fn attribute(
        &mut self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError>;

    async fn is_enabled(&mut self, element: &Self::Element) -> Result<bool, ScraperError>;

    async fn click(&mut self, element: &Self::Element) -> Result<(), ScraperError>;

    async fn type_text(&mut self, element: &Self::Element, text: &str)
        -> Result<(), ScraperError>;

    async fn get_cookies(&mut self) -> Result<Vec<StoredCookie>, ScraperError>;

    async fn set_cookie(&mut self, cookie: &StoredCookie) -> Result<(), ScraperError>;

    /// End the session. Consumes the handle so no call can follow.
    async fn close(self) -> Result<(), ScraperError>
    where
        Self: Sized;
}

/// Scope a lookup actually runs against: document-scoped locators ignore the element.
pub(crate) fn effective_scope<'a, E>(locator: &Locator, scope: Option<&'a E>) -> Option<&'a E> {
    match locator.scope {
        revcrawl_core::LocatorScope::Document => None,
        revcrawl_core::LocatorScope::Element => scope,
    }
}
