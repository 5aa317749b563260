//! [`PageSession`] backed by a real browser over the WebDriver protocol.

use std::time::Duration;

use cookie::time::OffsetDateTime;
use cookie::SameSite;
use fantoccini::cookies::Cookie;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use revcrawl_core::{AppConfig, Locator};
use serde_json::{json, Value};

use crate::error::ScraperError;
use crate::page::{effective_scope, PageSession, StoredCookie};

/// Masks the automation flag some storefronts check before rendering reviews.
const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Browser launch settings sent as WebDriver capabilities.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub window_size: (u32, u32),
}

impl BrowserOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            window_size: (1920, 1080),
        }
    }

    /// Chrome capabilities: hardened flags, fixed window and user agent.
    #[must_use]
    pub fn capabilities(&self) -> serde_json::Map<String, Value> {
        let (width, height) = self.window_size;
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--window-size={width},{height}"),
            format!("--user-agent={}", self.user_agent),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }

        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "excludeSwitches": ["enable-automation"],
                "useAutomationExtension": false,
            }),
        );
        caps
    }
}

/// Check that a WebDriver server is reachable and ready for a new session.
///
/// # Errors
///
/// Returns [`ScraperError::DriverUnavailable`] if `/status` cannot be fetched,
/// answers with a non-success status, or reports `ready: false`.
pub async fn probe_webdriver(webdriver_url: &str, timeout: Duration) -> Result<(), ScraperError> {
    let status_url = format!("{}/status", webdriver_url.trim_end_matches('/'));
    let unavailable = |reason: String| ScraperError::DriverUnavailable {
        url: webdriver_url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client
        .get(&status_url)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    if !response.status().is_success() {
        return Err(unavailable(format!(
            "status endpoint answered {}",
            response.status().as_u16()
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| unavailable(format!("unreadable status body: {e}")))?;

    match body.pointer("/value/ready").and_then(Value::as_bool) {
        Some(false) => {
            let message = body
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or("not ready");
            Err(unavailable(message.to_string()))
        }
        _ => Ok(()),
    }
}

pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Open a new browser session.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::DriverUnavailable`] if the WebDriver server
    /// refuses or fails to create the session.
    pub async fn connect(options: &BrowserOptions) -> Result<Self, ScraperError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(options.capabilities());

        let client = builder
            .connect(&options.webdriver_url)
            .await
            .map_err(|e| ScraperError::DriverUnavailable {
                url: options.webdriver_url.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            webdriver_url = %options.webdriver_url,
            headless = options.headless,
            "browser session started"
        );

        let mut session = Self { client };
        if let Err(e) = session.run_script(HIDE_WEBDRIVER_SCRIPT).await {
            tracing::debug!(error = %e, "could not mask webdriver flag");
        }
        Ok(session)
    }

    async fn find_elements(
        &self,
        locator: &Locator,
        scope: Option<&Element>,
    ) -> Result<Vec<Element>, ScraperError> {
        let css = fantoccini::Locator::Css(&locator.selector);
        let found = match effective_scope(locator, scope) {
            Some(element) => element.find_all(css).await,
            None => self.client.find_all(css).await,
        };
        found.map_err(|e| ScraperError::driver("find", e))
    }
}

fn to_stored(cookie: &Cookie<'static>) -> StoredCookie {
    StoredCookie {
        name: cookie.name().to_string(),
        value: cookie.value().to_string(),
        domain: cookie.domain().map(str::to_string),
        path: cookie.path().map(str::to_string),
        secure: cookie.secure(),
        http_only: cookie.http_only(),
        expiry: cookie.expires_datetime().map(|t| t.unix_timestamp()),
        same_site: cookie.same_site().map(|s| s.to_string()),
    }
}

fn to_browser(stored: &StoredCookie) -> Cookie<'static> {
    let mut cookie = Cookie::new(stored.name.clone(), stored.value.clone());
    if let Some(domain) = &stored.domain {
        cookie.set_domain(domain.clone());
    }
    if let Some(path) = &stored.path {
        cookie.set_path(path.clone());
    }
    if let Some(secure) = stored.secure {
        cookie.set_secure(secure);
    }
    if let Some(http_only) = stored.http_only {
        cookie.set_http_only(http_only);
    }
    if let Some(expiry) = stored.expiry {
        match OffsetDateTime::from_unix_timestamp(expiry) {
            Ok(at) => cookie.set_expires(at),
            Err(e) => tracing::debug!(cookie = %stored.name, error = %e, "ignoring cookie expiry"),
        }
    }
    if let Some(same_site) = stored.same_site.as_deref().and_then(parse_same_site) {
        cookie.set_same_site(same_site);
    }
    cookie
}

fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Some(SameSite::Strict),
        "lax" => Some(SameSite::Lax),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

impl PageSession for WebDriverSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| ScraperError::driver("navigate", e))
    }

    async fn reload(&mut self) -> Result<(), ScraperError> {
        self.client
            .refresh()
            .await
            .map_err(|e| ScraperError::driver("reload", e))
    }

    async fn current_address(&mut self) -> Result<String, ScraperError> {
        self.client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| ScraperError::driver("current_url", e))
    }

    async fn current_content(&mut self) -> Result<String, ScraperError> {
        self.client
            .source()
            .await
            .map_err(|e| ScraperError::driver("source", e))
    }

    async fn run_script(&mut self, source: &str) -> Result<Value, ScraperError> {
        self.client
            .execute(source, Vec::new())
            .await
            .map_err(|e| ScraperError::driver("execute", e))
    }

    async fn find_one(
        &mut self,
        locator: &Locator,
        scope: Option<&Element>,
    ) -> Result<Option<Element>, ScraperError> {
        Ok(self.find_elements(locator, scope).await?.into_iter().next())
    }

    async fn find_all(
        &mut self,
        locator: &Locator,
        scope: Option<&Element>,
    ) -> Result<Vec<Element>, ScraperError> {
        self.find_elements(locator, scope).await
    }

    async fn text(&mut self, element: &Element) -> Result<String, ScraperError> {
        element
            .text()
            .await
            .map_err(|e| ScraperError::driver("text", e))
    }

    async fn attribute(
        &mut self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, ScraperError> {
        // textContent is a DOM property, not a markup attribute.
        let value = if name == "textContent" {
            element.prop(name).await
        } else {
            element.attr(name).await
        };
        value.map_err(|e| ScraperError::driver("attribute", e))
    }

    async fn is_enabled(&mut self, element: &Element) -> Result<bool, ScraperError> {
        element
            .is_enabled()
            .await
            .map_err(|e| ScraperError::driver("is_enabled", e))
    }

    async fn click(&mut self, element: &Element) -> Result<(), ScraperError> {
        element
            .click()
            .await
            .map_err(|e| ScraperError::driver("click", e))
    }

    async fn type_text(&mut self, element: &Element, text: &str) -> Result<(), ScraperError> {
        element
            .send_keys(text)
            .await
            .map_err(|e| ScraperError::driver("send_keys", e))
    }

    async fn get_cookies(&mut self) -> Result<Vec<StoredCookie>, ScraperError> {
        let cookies = self
            .client
            .get_all_cookies()
            .await
            .map_err(|e| ScraperError::driver("get_cookies", e))?;
        Ok(cookies.iter().map(to_stored).collect())
    }

    async fn set_cookie(&mut self, cookie: &StoredCookie) -> Result<(), ScraperError> {
        self.client
            .add_cookie(to_browser(cookie))
            .await
            .map_err(|e| ScraperError::driver("add_cookie", e))
    }

    async fn close(self) -> Result<(), ScraperError> {
        self.client
            .close()
            .await
            .map_err(|e| ScraperError::driver("close", e))
    }
}
