//! Authentication checks and recovery for the browsing session.
//!
//! Login state is never cached: every check inspects a freshly rendered page.
//! Recovery runs in tiers: persisted cookies first, then configured
//! credentials, then a bounded wait for a human to log in through the
//! visible browser window.

use std::time::Duration;

use revcrawl_core::{Credentials, LocatorChain, LocatorTable, SiteProfile};
use tokio::time::Instant;

use crate::cookies::CookieStore;
use crate::extract::{find_first_enabled, Lookup};
use crate::pacing::Pacing;
use crate::page::PageSession;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the guard may try to log in when cookies do not help.
#[derive(Debug, Clone)]
pub struct LoginSettings {
    /// Allow waiting for a human to log in through the browser window.
    pub interactive: bool,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub credentials: Option<Credentials>,
}

/// Returns `true` when the rendered page shows a signed-in shopper.
///
/// Requires a login indicator in the lowercased content and the absence of
/// the sign-in marker in the address. The anonymous greeting vetoes the
/// indicators since it shares their wording.
#[must_use]
pub fn is_authenticated_view(site: &SiteProfile, address: &str, content: &str) -> bool {
    if site.is_signin_address(address) {
        return false;
    }
    let content = content.to_lowercase();
    if site
        .anonymous_indicators
        .iter()
        .any(|marker| content.contains(&marker.to_lowercase()))
    {
        return false;
    }
    site.login_indicators
        .iter()
        .any(|indicator| content.contains(&indicator.to_lowercase()))
}

pub struct SessionGuard {
    site: SiteProfile,
    cookies: CookieStore,
    login: LoginSettings,
    locators: LocatorTable,
    pacing: Pacing,
}

impl SessionGuard {
    #[must_use]
    pub fn new(
        site: SiteProfile,
        cookies: CookieStore,
        login: LoginSettings,
        locators: LocatorTable,
        pacing: Pacing,
    ) -> Self {
        Self {
            site,
            cookies,
            login,
            locators,
            pacing,
        }
    }

    #[must_use]
    pub fn site(&self) -> &SiteProfile {
        &self.site
    }

    /// Inspect whatever page is currently rendered, without navigating.
    pub async fn current_view_is_authenticated<S: PageSession>(&self, session: &mut S) -> bool {
        let address = match session.current_address().await {
            Ok(address) => address,
            Err(e) => {
                tracing::debug!(error = %e, "could not read current address");
                return false;
            }
        };
        let content = session.current_content().await.unwrap_or_default();
        is_authenticated_view(&self.site, &address, &content)
    }

    /// Navigate to the account page and check for a signed-in rendering.
    pub async fn is_authenticated<S: PageSession>(&self, session: &mut S) -> bool {
        if let Err(e) = session.navigate(&self.site.account_url).await {
            tracing::warn!(error = %e, "account page navigation failed");
            return false;
        }
        self.pacing.settle().await;
        self.current_view_is_authenticated(session).await
    }

    /// Make sure the session is signed in, recovering if it is not.
    ///
    /// Returns `false` when every recovery tier fails; callers continue
    /// unauthenticated.
    pub async fn ensure_authenticated<S: PageSession>(&self, session: &mut S) -> bool {
        if self.is_authenticated(session).await {
            return true;
        }

        tracing::info!("session not authenticated; attempting recovery");

        if self.restore_from_cookies(session).await {
            tracing::info!("session restored from saved cookies");
            return true;
        }

        if let Some(credentials) = &self.login.credentials {
            if self.login_with_credentials(session, credentials).await {
                return true;
            }
        }

        if self.login.interactive && self.interactive_login(session).await {
            return true;
        }

        tracing::warn!("session recovery failed; continuing unauthenticated");
        false
    }

    /// Inject the persisted cookie set, reload, and re-check.
    ///
    /// A missing or unreadable cookie file counts as "no cookies".
    pub async fn restore_from_cookies<S: PageSession>(&self, session: &mut S) -> bool {
        let cookies = match self.cookies.load() {
            Ok(Some(cookies)) if !cookies.is_empty() => cookies,
            Ok(_) => {
                tracing::debug!(path = %self.cookies.path().display(), "no saved cookies");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable cookie file");
                return false;
            }
        };

        if let Err(e) = session.navigate(&self.site.account_url).await {
            tracing::warn!(error = %e, "account page navigation failed");
            return false;
        }

        let mut injected = 0usize;
        for cookie in &cookies {
            match session.set_cookie(cookie).await {
                Ok(()) => injected += 1,
                Err(e) => tracing::warn!(cookie = %cookie.name, error = %e, "cookie rejected"),
            }
        }
        tracing::debug!(injected, total = cookies.len(), "cookies injected");

        if let Err(e) = session.reload().await {
            tracing::warn!(error = %e, "reload after cookie injection failed");
            return false;
        }
        self.pacing.settle().await;
        self.current_view_is_authenticated(session).await
    }

    /// Open the login page and wait up to the configured window for a human
    /// to sign in. Cookies are persisted on success.
    pub async fn interactive_login<S: PageSession>(&self, session: &mut S) -> bool {
        if let Err(e) = session.navigate(&self.site.login_url).await {
            tracing::warn!(error = %e, "login page navigation failed");
            return false;
        }

        tracing::info!(
            timeout_secs = self.login.timeout.as_secs(),
            "waiting for manual login in the browser window"
        );

        let deadline = Instant::now() + self.login.timeout;
        let poll = self.login.poll_interval.max(MIN_POLL_INTERVAL);
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
            if self.current_view_is_authenticated(session).await {
                break;
            }
        }

        if self.is_authenticated(session).await {
            tracing::info!("manual login detected");
            self.persist_cookies(session).await;
            true
        } else {
            tracing::warn!("manual login window elapsed without a signed-in session");
            false
        }
    }

    /// Fill and submit the sign-in form. Cookies are persisted on success.
    pub async fn login_with_credentials<S: PageSession>(
        &self,
        session: &mut S,
        credentials: &Credentials,
    ) -> bool {
        if let Err(e) = session.navigate(&self.site.login_url).await {
            tracing::warn!(error = %e, "login page navigation failed");
            return false;
        }
        self.pacing.settle().await;

        let t = &self.locators;
        if !self.fill(session, &t.login_email, &credentials.email).await {
            return false;
        }
        if self.press(session, &t.login_continue).await {
            self.pacing.settle().await;
        }
        if !self.fill(session, &t.login_password, &credentials.password).await {
            return false;
        }
        if !self.press(session, &t.login_submit).await {
            tracing::warn!("sign-in submit control not found");
            return false;
        }
        self.pacing.settle().await;

        let address = session.current_address().await.unwrap_or_default();
        if self.site.is_signin_address(&address) {
            tracing::warn!("credential login rejected");
            return false;
        }

        tracing::info!("credential login succeeded");
        self.persist_cookies(session).await;
        true
    }

    async fn fill<S: PageSession>(&self, session: &mut S, chain: &LocatorChain, text: &str) -> bool {
        let Lookup::Hit(input) = find_first_enabled(session, chain).await else {
            tracing::warn!(chain = chain.name(), "login input not found");
            return false;
        };
        match session.type_text(&input, text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(chain = chain.name(), error = %e, "typing into login input failed");
                false
            }
        }
    }

    async fn press<S: PageSession>(&self, session: &mut S, chain: &LocatorChain) -> bool {
        let Lookup::Hit(control) = find_first_enabled(session, chain).await else {
            return false;
        };
        match session.click(&control).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(chain = chain.name(), error = %e, "login click failed");
                false
            }
        }
    }

    /// Save the session's cookies; failures are logged, never fatal.
    pub async fn persist_cookies<S: PageSession>(&self, session: &mut S) {
        match session.get_cookies().await {
            Ok(cookies) => match self.cookies.save(&cookies) {
                Ok(()) => tracing::info!(
                    count = cookies.len(),
                    path = %self.cookies.path().display(),
                    "cookies saved"
                ),
                Err(e) => tracing::warn!(error = %e, "failed to save cookies"),
            },
            Err(e) => tracing::warn!(error = %e, "failed to read session cookies"),
        }
    }
}
