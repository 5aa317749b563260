//! Declarative locator tables.
//!
//! Every semantic field the crawler reads (a product title, a review date, the
//! "next page" control) is described by a [`LocatorChain`]: an ordered list of
//! CSS selectors tried until one matches. The built-in table targets current
//! storefront markup; a YAML file can replace individual chains without a
//! rebuild when the markup shifts.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Placeholder substituted with a star rating in the star-filter chain.
pub const STAR_PLACEHOLDER: &str = "{star}";

/// Root a locator is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocatorScope {
    /// Always searched from the document root.
    Document,
    /// Searched beneath the element being extracted from, or the document
    /// when no element is given.
    #[default]
    Element,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub selector: String,
    pub scope: LocatorScope,
}

impl Locator {
    #[must_use]
    pub fn css(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            scope: LocatorScope::Element,
        }
    }

    #[must_use]
    pub fn document(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            scope: LocatorScope::Document,
        }
    }
}

/// One entry of a chain as written in a locators file: either a bare selector
/// string or a map with an explicit scope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocatorEntry {
    Bare(String),
    Scoped {
        selector: String,
        #[serde(default)]
        scope: LocatorScope,
    },
}

impl From<LocatorEntry> for Locator {
    fn from(entry: LocatorEntry) -> Self {
        match entry {
            LocatorEntry::Bare(selector) => Locator::css(&selector),
            LocatorEntry::Scoped { selector, scope } => Locator { selector, scope },
        }
    }
}

/// Named, ordered fallback list for one field. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<LocatorEntry>")]
pub struct LocatorChain {
    name: String,
    locators: Vec<Locator>,
}

impl From<Vec<LocatorEntry>> for LocatorChain {
    fn from(entries: Vec<LocatorEntry>) -> Self {
        Self {
            name: String::new(),
            locators: entries.into_iter().map(Locator::from).collect(),
        }
    }
}

impl LocatorChain {
    #[must_use]
    pub fn new(name: &str, locators: Vec<Locator>) -> Self {
        Self {
            name: name.to_string(),
            locators,
        }
    }

    /// Chain of element-scoped CSS selectors.
    #[must_use]
    pub fn css(name: &str, selectors: &[&str]) -> Self {
        Self::new(name, selectors.iter().map(|s| Locator::css(s)).collect())
    }

    /// Chain of document-scoped CSS selectors.
    #[must_use]
    pub fn document(name: &str, selectors: &[&str]) -> Self {
        Self::new(name, selectors.iter().map(|s| Locator::document(s)).collect())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Locator> {
        self.locators.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// Copy of this chain with every `placeholder` in its selectors replaced by `value`.
    #[must_use]
    pub fn instantiate(&self, placeholder: &str, value: &str) -> Self {
        Self {
            name: format!("{}[{value}]", self.name),
            locators: self
                .locators
                .iter()
                .map(|l| Locator {
                    selector: l.selector.replace(placeholder, value),
                    scope: l.scope,
                })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LocatorChain {
    type Item = &'a Locator;
    type IntoIter = std::slice::Iter<'a, Locator>;

    fn into_iter(self) -> Self::IntoIter {
        self.locators.iter()
    }
}

/// Every chain the crawler consults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorTable {
    pub product_results: LocatorChain,
    pub product_title: LocatorChain,
    pub product_url: LocatorChain,
    pub product_price: LocatorChain,
    pub product_rating: LocatorChain,
    pub review_elements: LocatorChain,
    pub review_text: LocatorChain,
    pub review_rating: LocatorChain,
    pub review_date: LocatorChain,
    pub reviewer_name: LocatorChain,
    pub review_title: LocatorChain,
    pub next_page: LocatorChain,
    pub star_filter: LocatorChain,
    pub login_email: LocatorChain,
    pub login_continue: LocatorChain,
    pub login_password: LocatorChain,
    pub login_submit: LocatorChain,
}

const SUBMIT_SELECTORS: [&str; 3] = [
    "input[type='submit']",
    "button[type='submit']",
    ".a-button-primary input",
];

impl Default for LocatorTable {
    fn default() -> Self {
        let mut login_continue = vec!["#continue"];
        login_continue.extend(SUBMIT_SELECTORS);
        let mut login_submit = vec!["#signInSubmit"];
        login_submit.extend(SUBMIT_SELECTORS);

        Self {
            product_results: LocatorChain::document(
                "product_results",
                &[
                    "[data-component-type=\"s-search-result\"]",
                    ".s-result-item",
                    "[data-asin]",
                ],
            ),
            product_title: LocatorChain::css(
                "product_title",
                &["h2 a span", "h2 span", ".s-color-base", "a[href*=\"/dp/\"] span"],
            ),
            product_url: LocatorChain::css(
                "product_url",
                &[
                    "h2 a",
                    "a[href*=\"/dp/\"]",
                    "a[href*=\"/gp/product/\"]",
                    ".s-size-mini a",
                    "a[data-hook=\"product-link\"]",
                    ".s-link-style a",
                    "a[href*=\"/product/\"]",
                ],
            ),
            product_price: LocatorChain::css(
                "product_price",
                &[".a-price .a-offscreen", ".a-price-whole", ".a-price-range"],
            ),
            product_rating: LocatorChain::css(
                "product_rating",
                &[
                    ".a-icon-alt",
                    "[data-hook=\"rating-out-of-text\"]",
                    ".a-icon-star-small",
                    ".a-icon-star",
                    ".a-star-mini",
                    ".a-star-small",
                    "[aria-label*=\"out of 5 stars\"]",
                    "[aria-label*=\"stars\"]",
                ],
            ),
            review_elements: LocatorChain::document(
                "review_elements",
                &[
                    "[data-hook=\"review\"]",
                    ".a-section.review",
                    ".cr-original-review-item",
                    ".review",
                ],
            ),
            review_text: LocatorChain::css(
                "review_text",
                &[
                    "[data-hook=\"review-body\"] span",
                    "[data-hook=\"review-body\"]",
                    ".review-text-content span",
                    ".review-text",
                ],
            ),
            review_rating: LocatorChain::css(
                "review_rating",
                &[
                    "[data-hook=\"review-star-rating\"]",
                    "[data-hook=\"cmps-review-star-rating\"]",
                    ".review-rating",
                ],
            ),
            review_date: LocatorChain::css(
                "review_date",
                &["[data-hook=\"review-date\"]", ".review-date"],
            ),
            reviewer_name: LocatorChain::css(
                "reviewer_name",
                &[
                    "[data-hook=\"review-author\"] .a-profile-name",
                    "[data-hook=\"review-author\"]",
                    ".a-profile-name",
                    ".review-byline .author",
                ],
            ),
            review_title: LocatorChain::css(
                "review_title",
                &[
                    "[data-hook=\"review-title\"] span:not(.a-icon-alt):not(.a-letter-space)",
                    "[data-hook=\"review-title\"]",
                    ".review-title-content span",
                    ".review-title",
                    "a[data-hook*=\"title\"]",
                ],
            ),
            next_page: LocatorChain::document(
                "next_page",
                &[
                    ".a-pagination .a-last a",
                    ".a-pagination .a-next",
                    "a[aria-label=\"Next Page\"]",
                    "[aria-label=\"Next Page\"]",
                    ".a-pagination .a-last",
                ],
            ),
            star_filter: LocatorChain::document(
                "star_filter",
                &[
                    "[data-hook=\"review-star-filter-{star}\"]",
                    "a[href*=\"filterByStar={star}_star\"]",
                    "button[data-hook=\"review-star-filter-{star}\"]",
                    "[aria-label*=\"{star} star\"]",
                ],
            ),
            login_email: LocatorChain::document(
                "login_email",
                &[
                    "#ap_email",
                    "[name=email]",
                    "input[type='email']",
                    "input[name='email']",
                ],
            ),
            login_continue: LocatorChain::document("login_continue", &login_continue),
            login_password: LocatorChain::document(
                "login_password",
                &[
                    "#ap_password",
                    "[name=password]",
                    "input[type='password']",
                    "input[name='password']",
                ],
            ),
            login_submit: LocatorChain::document("login_submit", &login_submit),
        }
    }
}

impl LocatorTable {
    /// Star-filter chain for one rating.
    #[must_use]
    pub fn star_filter_for(&self, star: u8) -> LocatorChain {
        self.star_filter
            .instantiate(STAR_PLACEHOLDER, &star.to_string())
    }

    fn chains(&self) -> [(&'static str, &LocatorChain); 17] {
        [
            ("product_results", &self.product_results),
            ("product_title", &self.product_title),
            ("product_url", &self.product_url),
            ("product_price", &self.product_price),
            ("product_rating", &self.product_rating),
            ("review_elements", &self.review_elements),
            ("review_text", &self.review_text),
            ("review_rating", &self.review_rating),
            ("review_date", &self.review_date),
            ("reviewer_name", &self.reviewer_name),
            ("review_title", &self.review_title),
            ("next_page", &self.next_page),
            ("star_filter", &self.star_filter),
            ("login_email", &self.login_email),
            ("login_continue", &self.login_continue),
            ("login_password", &self.login_password),
            ("login_submit", &self.login_submit),
        ]
    }

    fn chains_mut(&mut self) -> [(&'static str, &mut LocatorChain); 17] {
        [
            ("product_results", &mut self.product_results),
            ("product_title", &mut self.product_title),
            ("product_url", &mut self.product_url),
            ("product_price", &mut self.product_price),
            ("product_rating", &mut self.product_rating),
            ("review_elements", &mut self.review_elements),
            ("review_text", &mut self.review_text),
            ("review_rating", &mut self.review_rating),
            ("review_date", &mut self.review_date),
            ("reviewer_name", &mut self.reviewer_name),
            ("review_title", &mut self.review_title),
            ("next_page", &mut self.next_page),
            ("star_filter", &mut self.star_filter),
            ("login_email", &mut self.login_email),
            ("login_continue", &mut self.login_continue),
            ("login_password", &mut self.login_password),
            ("login_submit", &mut self.login_submit),
        ]
    }

    /// Chains deserialized from a file carry no name; give each its field name.
    fn relabel(&mut self) {
        for (name, chain) in self.chains_mut() {
            if chain.name.is_empty() {
                chain.name = name.to_string();
            }
        }
    }

    /// Check that every chain is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an empty chain, a blank or
    /// duplicated selector, or a star-filter selector missing the `{star}`
    /// placeholder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, chain) in self.chains() {
            if chain.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "locator chain '{name}' must not be empty"
                )));
            }

            let mut seen = HashSet::new();
            for locator in chain.iter() {
                let selector = locator.selector.trim();
                if selector.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "locator chain '{name}' contains a blank selector"
                    )));
                }
                if !seen.insert(selector) {
                    return Err(ConfigError::Validation(format!(
                        "locator chain '{name}' repeats selector '{selector}'"
                    )));
                }
            }
        }

        if let Some(bad) = self
            .star_filter
            .iter()
            .find(|l| !l.selector.contains(STAR_PLACEHOLDER))
        {
            return Err(ConfigError::Validation(format!(
                "star_filter selector '{}' is missing the {STAR_PLACEHOLDER} placeholder",
                bad.selector
            )));
        }

        Ok(())
    }
}

/// Load a locator table from a YAML file, starting from the built-in table.
///
/// Fields absent from the file keep their built-in chains.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_locator_table(path: &Path) -> Result<LocatorTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocatorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_locator_table(&content)
}

/// Parse a locator table from YAML text. An empty document yields the built-in table.
///
/// # Errors
///
/// Returns `ConfigError` if the text cannot be parsed or fails validation.
pub fn parse_locator_table(content: &str) -> Result<LocatorTable, ConfigError> {
    let mut table = if content.trim().is_empty() {
        LocatorTable::default()
    } else {
        serde_yaml::from_str::<LocatorTable>(content).map_err(ConfigError::LocatorsFileParse)?
    };

    table.relabel();
    table.validate()?;

    Ok(table)
}

#[cfg(test)]
#[path = "locators_test.rs"]
mod tests;
