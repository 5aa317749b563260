use serde::{Deserialize, Serialize};

/// Placeholder written for any field whose locator chain found nothing.
pub const SENTINEL: &str = "N/A";

/// Extracted field text, or the sentinel when every locator missed.
///
/// Serializes as a plain string; a found value is always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldValue {
    Found(String),
    #[default]
    Missing,
}

impl FieldValue {
    /// Trim `raw`; whitespace-only text counts as missing.
    #[must_use]
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            FieldValue::Missing
        } else {
            FieldValue::Found(trimmed.to_string())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Found(s) => s,
            FieldValue::Missing => SENTINEL,
        }
    }

    #[must_use]
    pub fn found(&self) -> Option<&str> {
        match self {
            FieldValue::Found(s) => Some(s),
            FieldValue::Missing => None,
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for FieldValue {
    fn from(raw: String) -> Self {
        if raw.trim() == SENTINEL {
            FieldValue::Missing
        } else {
            FieldValue::from_text(&raw)
        }
    }
}

impl From<FieldValue> for String {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Found(s) => s,
            FieldValue::Missing => SENTINEL.to_string(),
        }
    }
}

/// One search result, in listing order. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub rank: u32,
    pub title: FieldValue,
    pub price: FieldValue,
    pub rating: FieldValue,
    pub url: FieldValue,
}

impl ProductRecord {
    /// `(title, url)` identity used to match reviews back to their product.
    #[must_use]
    pub fn identity(&self) -> (&FieldValue, &FieldValue) {
        (&self.title, &self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub text: FieldValue,
    pub star_rating: FieldValue,
    pub date: FieldValue,
    pub reviewer_name: FieldValue,
    pub title: FieldValue,
}

impl ReviewRecord {
    /// Attach the owning product's identity and rank.
    #[must_use]
    pub fn enrich(self, product: &ProductRecord) -> EnrichedReview {
        EnrichedReview {
            review: self,
            product_title: product.title.clone(),
            product_url: product.url.clone(),
            product_rank: product.rank,
        }
    }
}

/// A review plus a back-reference to the product it was collected for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedReview {
    #[serde(flatten)]
    pub review: ReviewRecord,
    pub product_title: FieldValue,
    pub product_url: FieldValue,
    pub product_rank: u32,
}

impl EnrichedReview {
    #[must_use]
    pub fn belongs_to(&self, product: &ProductRecord) -> bool {
        (&self.product_title, &self.product_url) == product.identity()
    }
}
