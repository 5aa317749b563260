//! Output file names derived from the search keyword and run time.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

const FILE_PREFIX: &str = "amazon_reviews";
const FALLBACK_SLUG: &str = "search";

/// Lowercase keyword with runs of anything but ASCII letters and digits
/// collapsed to a single `_`.
#[must_use]
pub fn keyword_slug(keyword: &str) -> String {
    let mut slug = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// `{dir}/amazon_reviews_{slug}_{YYYYmmdd_HHMMSS}.{extension}`
#[must_use]
pub fn output_path(dir: &Path, keyword: &str, run_at: DateTime<Utc>, extension: &str) -> PathBuf {
    dir.join(format!(
        "{FILE_PREFIX}_{}_{}.{extension}",
        keyword_slug(keyword),
        run_at.format("%Y%m%d_%H%M%S")
    ))
}
