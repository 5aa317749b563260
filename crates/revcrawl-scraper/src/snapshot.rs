//! Offline [`PageSession`] over captured HTML.
//!
//! Pages are registered per address. Lookups run CSS selectors through the
//! `scraper` crate, clicking a link navigates to its `href`, and a cookie jar
//! decides whether gated pages render or bounce to the sign-in page. This lets
//! crawl logic run against saved storefront markup without a browser.
//!
//! Only built with the `snapshot` feature.

use std::collections::HashMap;
use std::sync::LazyLock;

use revcrawl_core::Locator;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::ScraperError;
use crate::page::{effective_scope, PageSession, StoredCookie};

static ALL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("*").expect("valid universal selector"));

const BLANK_PAGE: &str = "<html><head></head><body></body></html>";
const DEFAULT_SIGNIN_PAGE: &str =
    "<html><body><h1>Sign in</h1><form><input id=\"ap_email\" type=\"email\"></form></body></html>";

/// Change to the signed-in state applied the first time an address is visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    SignIn,
    Expire,
}

#[derive(Debug, Clone)]
enum Content {
    Static(String),
    ByAuth { signed_in: String, anonymous: String },
}

#[derive(Debug, Clone)]
struct Route {
    content: Content,
    gated: bool,
}

struct LoadedPage {
    address: String,
    source: String,
    html: Html,
}

impl LoadedPage {
    fn element(&self, ordinal: usize) -> Option<ElementRef<'_>> {
        self.html.select(&ALL).nth(ordinal)
    }

    fn ordinal_of(&self, element: ElementRef<'_>) -> Option<usize> {
        self.html.select(&ALL).position(|e| e.id() == element.id())
    }
}

/// Handle to an element of the page that was current when it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotElement {
    generation: u64,
    ordinal: usize,
}

pub struct SnapshotSession {
    signin_url: String,
    auth_cookie: String,
    routes: HashMap<String, Route>,
    effects: HashMap<String, SessionEffect>,
    jar: Vec<StoredCookie>,
    current: Option<LoadedPage>,
    generation: u64,
    visits: Vec<String>,
    typed: Vec<(String, String)>,
}

impl SnapshotSession {
    /// Empty session whose gated pages redirect to `signin_url`.
    #[must_use]
    pub fn new(signin_url: &str) -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            signin_url.to_string(),
            Route {
                content: Content::Static(DEFAULT_SIGNIN_PAGE.to_string()),
                gated: false,
            },
        );
        Self {
            signin_url: signin_url.to_string(),
            auth_cookie: "session-token".to_string(),
            routes,
            effects: HashMap::new(),
            jar: Vec::new(),
            current: None,
            generation: 0,
            visits: Vec::new(),
            typed: Vec::new(),
        }
    }

    /// Name of the cookie whose presence means "signed in".
    #[must_use]
    pub fn with_auth_cookie_name(mut self, name: &str) -> Self {
        self.auth_cookie = name.to_string();
        self
    }

    #[must_use]
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                content: Content::Static(html.to_string()),
                gated: false,
            },
        );
        self
    }

    /// Page that redirects to the sign-in page unless signed in.
    #[must_use]
    pub fn with_gated_page(mut self, url: &str, html: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                content: Content::Static(html.to_string()),
                gated: true,
            },
        );
        self
    }

    /// Page rendered differently for signed-in and anonymous visitors.
    #[must_use]
    pub fn with_account_page(mut self, url: &str, signed_in: &str, anonymous: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                content: Content::ByAuth {
                    signed_in: signed_in.to_string(),
                    anonymous: anonymous.to_string(),
                },
                gated: false,
            },
        );
        self
    }

    /// Apply `effect` the first time `url` is visited, before it renders.
    #[must_use]
    pub fn with_visit_effect(mut self, url: &str, effect: SessionEffect) -> Self {
        self.effects.insert(url.to_string(), effect);
        self
    }

    /// Start with the auth cookie already in the jar.
    #[must_use]
    pub fn signed_in(mut self) -> Self {
        self.sign_in();
        self
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.jar.iter().any(|c| c.name == self.auth_cookie)
    }

    /// Every address passed to `navigate`, in order.
    #[must_use]
    pub fn visits(&self) -> &[String] {
        &self.visits
    }

    /// Text typed into inputs as `(id or name, text)` pairs.
    #[must_use]
    pub fn typed_values(&self) -> &[(String, String)] {
        &self.typed
    }

    fn sign_in(&mut self) {
        if !self.is_signed_in() {
            let mut cookie = StoredCookie::new(&self.auth_cookie, "snapshot");
            cookie.path = Some("/".to_string());
            self.jar.push(cookie);
        }
    }

    fn expire(&mut self) {
        let name = self.auth_cookie.clone();
        self.jar.retain(|c| c.name != name);
    }

    fn load(&mut self, address: &str, source: &str) {
        self.generation += 1;
        self.current = Some(LoadedPage {
            address: address.to_string(),
            source: source.to_string(),
            html: Html::parse_document(source),
        });
    }

    fn render(&mut self, url: &str) {
        let key = url.split('#').next().unwrap_or(url).to_string();

        match self.effects.remove(&key) {
            Some(SessionEffect::SignIn) => self.sign_in(),
            Some(SessionEffect::Expire) => self.expire(),
            None => {}
        }

        let signed_in = self.is_signed_in();
        let Some(route) = self.routes.get(&key).cloned() else {
            self.load(url, BLANK_PAGE);
            return;
        };

        if route.gated && !signed_in {
            let signin = self.signin_url.clone();
            let source = match self.routes.get(&signin).map(|r| r.content.clone()) {
                Some(Content::Static(html)) => html,
                _ => DEFAULT_SIGNIN_PAGE.to_string(),
            };
            self.load(&signin, &source);
            return;
        }

        let source = match route.content {
            Content::Static(html) => html,
            Content::ByAuth {
                signed_in: html, ..
            } if signed_in => html,
            Content::ByAuth { anonymous, .. } => anonymous,
        };
        self.load(url, &source);
    }

    fn page(&self) -> Result<&LoadedPage, ScraperError> {
        self.current
            .as_ref()
            .ok_or_else(|| ScraperError::driver("lookup", "no page loaded"))
    }

    fn resolve<'a>(
        &self,
        page: &'a LoadedPage,
        element: &SnapshotElement,
    ) -> Result<ElementRef<'a>, ScraperError> {
        if element.generation != self.generation {
            return Err(ScraperError::driver("lookup", "stale element reference"));
        }
        page.element(element.ordinal)
            .ok_or_else(|| ScraperError::driver("lookup", "element no longer attached"))
    }

    fn select(
        &self,
        locator: &Locator,
        scope: Option<&SnapshotElement>,
    ) -> Result<Vec<SnapshotElement>, ScraperError> {
        let selector =
            Selector::parse(&locator.selector).map_err(|e| ScraperError::InvalidLocator {
                selector: locator.selector.clone(),
                reason: e.to_string(),
            })?;
        let page = self.page()?;

        let matches: Vec<ElementRef<'_>> = match effective_scope(locator, scope) {
            Some(scope) => {
                let root = self.resolve(page, scope)?;
                root.select(&selector)
                    .filter(|e| e.id() != root.id())
                    .collect()
            }
            None => page.html.select(&selector).collect(),
        };

        Ok(matches
            .into_iter()
            .filter_map(|e| page.ordinal_of(e))
            .map(|ordinal| SnapshotElement {
                generation: self.generation,
                ordinal,
            })
            .collect())
    }

    /// Link target of the element or its nearest linking ancestor.
    fn link_target(element: ElementRef<'_>) -> Option<String> {
        std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .find_map(|e| {
                let value = e.value();
                value
                    .attr("href")
                    .or_else(|| value.attr("data-href"))
                    .map(str::to_string)
            })
    }
}

impl PageSession for SnapshotSession {
    type Element = SnapshotElement;

    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        self.visits.push(url.to_string());
        self.render(url);
        Ok(())
    }

    async fn reload(&mut self) -> Result<(), ScraperError> {
        let address = self.page()?.address.clone();
        self.render(&address);
        Ok(())
    }

    async fn current_address(&mut self) -> Result<String, ScraperError> {
        Ok(self
            .current
            .as_ref()
            .map_or_else(|| "about:blank".to_string(), |p| p.address.clone()))
    }

    async fn current_content(&mut self) -> Result<String, ScraperError> {
        Ok(self
            .current
            .as_ref()
            .map(|p| p.source.clone())
            .unwrap_or_default())
    }

    async fn run_script(&mut self, _source: &str) -> Result<Value, ScraperError> {
        Ok(Value::Null)
    }

    async fn find_one(
        &mut self,
        locator: &Locator,
        scope: Option<&SnapshotElement>,
    ) -> Result<Option<SnapshotElement>, ScraperError> {
        Ok(self.select(locator, scope)?.into_iter().next())
    }

    async fn find_all(
        &mut self,
        locator: &Locator,
        scope: Option<&SnapshotElement>,
    ) -> Result<Vec<SnapshotElement>, ScraperError> {
        self.select(locator, scope)
    }

    async fn text(&mut self, element: &SnapshotElement) -> Result<String, ScraperError> {
        let page = self.page()?;
        let el = self.resolve(page, element)?;
        let raw: String = el.text().collect();
        Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    async fn attribute(
        &mut self,
        element: &SnapshotElement,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        let page = self.page()?;
        let el = self.resolve(page, element)?;
        if name == "textContent" {
            return Ok(Some(el.text().collect()));
        }
        Ok(el.value().attr(name).map(str::to_string))
    }

    async fn is_enabled(&mut self, element: &SnapshotElement) -> Result<bool, ScraperError> {
        let page = self.page()?;
        let el = self.resolve(page, element)?;
        Ok(el.value().attr("disabled").is_none())
    }

    async fn click(&mut self, element: &SnapshotElement) -> Result<(), ScraperError> {
        let (address, target) = {
            let page = self.page()?;
            let el = self.resolve(page, element)?;
            (page.address.clone(), Self::link_target(el))
        };

        let Some(href) = target else {
            return Ok(());
        };
        let next = reqwest::Url::parse(&address)
            .and_then(|base| base.join(&href))
            .map_err(|e| ScraperError::driver("click", e))?;
        self.navigate(next.as_str()).await
    }

    async fn type_text(&mut self, element: &SnapshotElement, text: &str) -> Result<(), ScraperError> {
        let key = {
            let page = self.page()?;
            let el = self.resolve(page, element)?;
            let value = el.value();
            value
                .id()
                .or_else(|| value.attr("name"))
                .unwrap_or_else(|| value.name())
                .to_string()
        };
        self.typed.push((key, text.to_string()));
        Ok(())
    }

    async fn get_cookies(&mut self) -> Result<Vec<StoredCookie>, ScraperError> {
        Ok(self.jar.clone())
    }

    async fn set_cookie(&mut self, cookie: &StoredCookie) -> Result<(), ScraperError> {
        self.jar.retain(|c| c.name != cookie.name);
        self.jar.push(cookie.clone());
        Ok(())
    }

    async fn close(self) -> Result<(), ScraperError> {
        Ok(())
    }
}
