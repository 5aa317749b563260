use crate::app_config::{AppConfig, Credentials, OutputFormat};
use crate::ConfigError;

/// Default desktop browser identity presented by the automated session.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Crawler settings from `REVCRAWL_*` variables, after merging any `.env` file.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Crawler settings from the process environment only; no `.env` merge.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Settings read through `lookup`, so tests can supply a map instead of the
/// process environment.
///
/// Every setting has a default; only malformed values are rejected.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let base_url = or_default("REVCRAWL_BASE_URL", "https://www.amazon.com")
        .trim_end_matches('/')
        .to_string();
    let webdriver_url = or_default("REVCRAWL_WEBDRIVER_URL", "http://localhost:9515")
        .trim_end_matches('/')
        .to_string();
    let headless = parse_bool("REVCRAWL_HEADLESS", &or_default("REVCRAWL_HEADLESS", "true"))?;
    let user_agent = or_default("REVCRAWL_USER_AGENT", DEFAULT_USER_AGENT);
    let cookie_path = PathBuf::from(or_default("REVCRAWL_COOKIE_PATH", "./amazon_cookies.json"));
    let output_dir = PathBuf::from(or_default("REVCRAWL_OUTPUT_DIR", "output"));
    let output_format = or_default("REVCRAWL_OUTPUT_FORMAT", "both")
        .parse::<OutputFormat>()
        .map_err(|reason| ConfigError::InvalidEnvVar {
            var: "REVCRAWL_OUTPUT_FORMAT".to_string(),
            reason,
        })?;
    let locators_path = optional("REVCRAWL_LOCATORS_PATH").map(PathBuf::from);
    let log_level = or_default("REVCRAWL_LOG_LEVEL", "info");

    let top_count = parse_usize("REVCRAWL_TOP_COUNT", "3")?;
    let max_pages = parse_u32("REVCRAWL_MAX_PAGES", "2")?;
    let login_timeout_secs = parse_u64("REVCRAWL_LOGIN_TIMEOUT_SECS", "180")?;
    let login_poll_secs = parse_u64("REVCRAWL_LOGIN_POLL_SECS", "5")?;
    let page_settle_ms = parse_u64("REVCRAWL_PAGE_SETTLE_MS", "3000")?;
    let filter_settle_ms = parse_u64("REVCRAWL_FILTER_SETTLE_MS", "2000")?;
    let min_delay_ms = parse_u64("REVCRAWL_MIN_DELAY_MS", "2000")?;
    let max_delay_ms = parse_u64("REVCRAWL_MAX_DELAY_MS", "5000")?;

    if min_delay_ms > max_delay_ms {
        return Err(ConfigError::InvalidEnvVar {
            var: "REVCRAWL_MIN_DELAY_MS".to_string(),
            reason: format!("{min_delay_ms} exceeds REVCRAWL_MAX_DELAY_MS ({max_delay_ms})"),
        });
    }

    let credentials = match (optional("REVCRAWL_EMAIL"), optional("REVCRAWL_PASSWORD")) {
        (Some(email), Some(password)) => Some(Credentials { email, password }),
        _ => None,
    };

    Ok(AppConfig {
        base_url,
        webdriver_url,
        headless,
        user_agent,
        cookie_path,
        output_dir,
        output_format,
        locators_path,
        log_level,
        top_count,
        max_pages,
        login_timeout_secs,
        login_poll_secs,
        page_settle_ms,
        filter_settle_ms,
        min_delay_ms,
        max_delay_ms,
        credentials,
    })
}

/// Parse a boolean flag value (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`).
fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
