//! Locator-chain walking and field extraction.
//!
//! A chain is tried in order and the first usable hit wins. Lookup failures of
//! any kind are logged and treated as misses, so a field either yields trimmed
//! text or [`FieldValue::Missing`], never an error.

use percent_encoding::percent_decode_str;
use reqwest::Url;
use revcrawl_core::{FieldValue, Locator, LocatorChain, SiteProfile};

use crate::page::PageSession;

/// Outcome of a single lookup. A miss is an ordinary value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
}

impl<T> Lookup<T> {
    pub fn hit(self) -> Option<T> {
        match self {
            Lookup::Hit(v) => Some(v),
            Lookup::Miss => None,
        }
    }
}

/// Single lookup of `locator`; errors become misses.
pub async fn lookup_one<S: PageSession>(
    session: &mut S,
    locator: &Locator,
    scope: Option<&S::Element>,
) -> Lookup<S::Element> {
    match session.find_one(locator, scope).await {
        Ok(Some(element)) => Lookup::Hit(element),
        Ok(None) => Lookup::Miss,
        Err(e) => {
            tracing::debug!(selector = %locator.selector, error = %e, "lookup failed");
            Lookup::Miss
        }
    }
}

/// First non-empty element set produced by the chain, or an empty vec.
pub async fn find_all_first<S: PageSession>(
    session: &mut S,
    chain: &LocatorChain,
    scope: Option<&S::Element>,
) -> Vec<S::Element> {
    for locator in chain {
        match session.find_all(locator, scope).await {
            Ok(found) if !found.is_empty() => {
                tracing::debug!(
                    chain = chain.name(),
                    selector = %locator.selector,
                    count = found.len(),
                    "chain matched"
                );
                return found;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    chain = chain.name(),
                    selector = %locator.selector,
                    error = %e,
                    "lookup failed"
                );
            }
        }
    }
    Vec::new()
}

/// First control located by the chain that is currently actionable.
pub async fn find_first_enabled<S: PageSession>(
    session: &mut S,
    chain: &LocatorChain,
) -> Lookup<S::Element> {
    for locator in chain {
        if let Lookup::Hit(element) = lookup_one(session, locator, None).await {
            if is_actionable(session, &element).await {
                return Lookup::Hit(element);
            }
            tracing::debug!(chain = chain.name(), selector = %locator.selector, "control disabled");
        }
    }
    Lookup::Miss
}

/// Enabled per the session and not marked disabled through class or ARIA state.
pub async fn is_actionable<S: PageSession>(session: &mut S, element: &S::Element) -> bool {
    if !session.is_enabled(element).await.unwrap_or(false) {
        return false;
    }
    let class = session
        .attribute(element, "class")
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    if class.split_whitespace().any(|c| c == "a-disabled") {
        return false;
    }
    let aria = session
        .attribute(element, "aria-disabled")
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    !aria.eq_ignore_ascii_case("true")
}

/// Text of the first chain hit with non-blank text.
pub async fn extract_field<S: PageSession>(
    session: &mut S,
    scope: Option<&S::Element>,
    chain: &LocatorChain,
) -> FieldValue {
    for locator in chain {
        let Lookup::Hit(element) = lookup_one(session, locator, scope).await else {
            continue;
        };
        match session.text(&element).await {
            Ok(text) => {
                let value = FieldValue::from_text(&text);
                if !value.is_missing() {
                    return value;
                }
            }
            Err(e) => tracing::debug!(chain = chain.name(), error = %e, "text read failed"),
        }
    }
    tracing::debug!(chain = chain.name(), "field missing");
    FieldValue::Missing
}

/// Like [`extract_field`], but a hit only counts when it carries a digit.
///
/// Each located element is read as rendered text, then `aria-label`, then
/// `textContent`; icon ratings often render nothing but keep the value in a
/// label.
pub async fn extract_numeric_field<S: PageSession>(
    session: &mut S,
    scope: Option<&S::Element>,
    chain: &LocatorChain,
) -> FieldValue {
    for locator in chain {
        let Lookup::Hit(element) = lookup_one(session, locator, scope).await else {
            continue;
        };

        let text = session.text(&element).await.ok();
        let mut candidates = vec![text];
        for name in ["aria-label", "textContent"] {
            candidates.push(session.attribute(&element, name).await.ok().flatten());
        }

        if let Some(found) = candidates
            .into_iter()
            .flatten()
            .map(|c| c.trim().to_string())
            .find(|c| c.chars().any(|ch| ch.is_ascii_digit()))
        {
            return FieldValue::Found(found);
        }
    }
    tracing::debug!(chain = chain.name(), "numeric field missing");
    FieldValue::Missing
}

/// First whitespace token containing a digit, e.g. `"4.0"` from `"4.0 out of 5 stars"`.
#[must_use]
pub fn leading_number(value: &FieldValue) -> FieldValue {
    value
        .found()
        .and_then(|text| {
            text.split_whitespace()
                .find(|token| token.chars().any(|c| c.is_ascii_digit()))
        })
        .map_or(FieldValue::Missing, FieldValue::from_text)
}

/// Product link for a listing element.
///
/// Tries the chain's direct links first, then scans every anchor for a
/// redirect wrapper whose `url` parameter decodes to a product path, then for
/// any anchor that is itself a product path. Relative links are resolved
/// against the site base URL.
pub async fn extract_product_url<S: PageSession>(
    session: &mut S,
    scope: Option<&S::Element>,
    chain: &LocatorChain,
    site: &SiteProfile,
) -> FieldValue {
    for locator in chain {
        let Lookup::Hit(element) = lookup_one(session, locator, scope).await else {
            continue;
        };
        if let Some(href) = session.attribute(&element, "href").await.ok().flatten() {
            if site.is_product_address(&href) {
                if let Some(url) = absolutize(&href, &site.base_url) {
                    return FieldValue::Found(url);
                }
            }
        }
    }

    let anchors = session
        .find_all(&Locator::css("a"), scope)
        .await
        .unwrap_or_default();
    let mut direct = None;
    for anchor in &anchors {
        let Some(href) = session.attribute(anchor, "href").await.ok().flatten() else {
            continue;
        };
        if let Some(target) = unwrap_redirect(&href, &site.base_url) {
            if site.is_product_address(&target) {
                return FieldValue::Found(target);
            }
        } else if direct.is_none() && site.is_product_address(&href) {
            direct = absolutize(&href, &site.base_url);
        }
    }

    match direct {
        Some(url) => FieldValue::Found(url),
        None => {
            tracing::debug!(chain = chain.name(), "product url missing");
            FieldValue::Missing
        }
    }
}

/// Decoded target of a redirect-wrapper link carrying a `url` query parameter.
///
/// Returns `None` when `href` has no such parameter.
#[must_use]
pub fn unwrap_redirect(href: &str, base_url: &str) -> Option<String> {
    let parsed = Url::parse(base_url).ok()?.join(href).ok()?;
    let (_, wrapped) = parsed.query_pairs().find(|(k, _)| k == "url")?;

    // The query decoder already removed one layer; some wrappers encode twice.
    let decoded = percent_decode_str(&wrapped).decode_utf8_lossy().into_owned();
    absolutize(&decoded, base_url)
}

/// `href` resolved against `base_url`.
#[must_use]
pub fn absolutize(href: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    base.join(href.trim()).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.amazon.com";

    #[test]
    fn unwrap_redirect_decodes_target() {
        let href = "/sspa/click?ie=UTF8&spc=MTo&url=%2FNoise-Cancelling%2Fdp%2FB0SPONSOR1%2Fref%3Dsr_1_1_sspa%3Fkeywords%3Dheadphones";
        assert_eq!(
            unwrap_redirect(href, BASE).as_deref(),
            Some("https://www.amazon.com/Noise-Cancelling/dp/B0SPONSOR1/ref=sr_1_1_sspa?keywords=headphones")
        );
    }

    #[test]
    fn unwrap_redirect_handles_double_encoding() {
        let href = "https://www.amazon.com/sspa/click?url=%252Fdp%252FB0TWICE001";
        assert_eq!(
            unwrap_redirect(href, BASE).as_deref(),
            Some("https://www.amazon.com/dp/B0TWICE001")
        );
    }

    #[test]
    fn unwrap_redirect_ignores_plain_links() {
        assert_eq!(unwrap_redirect("/dp/B0PLAIN001", BASE), None);
    }

    #[test]
    fn absolutize_resolves_relative_paths() {
        assert_eq!(
            absolutize("/dp/B0REL00001", BASE).as_deref(),
            Some("https://www.amazon.com/dp/B0REL00001")
        );
        assert_eq!(
            absolutize("https://other.test/dp/X", BASE).as_deref(),
            Some("https://other.test/dp/X")
        );
    }

    #[test]
    fn leading_number_takes_first_numeric_token() {
        assert_eq!(
            leading_number(&FieldValue::from_text("4.0 out of 5 stars")),
            FieldValue::from_text("4.0")
        );
        assert_eq!(
            leading_number(&FieldValue::from_text("Rated 5 stars")),
            FieldValue::from_text("5")
        );
        assert_eq!(leading_number(&FieldValue::from_text("stars")), FieldValue::Missing);
        assert_eq!(leading_number(&FieldValue::Missing), FieldValue::Missing);
    }
}
