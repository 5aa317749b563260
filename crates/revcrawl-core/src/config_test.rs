use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    assert_eq!(cfg.base_url, "https://www.amazon.com");
    assert_eq!(cfg.webdriver_url, "http://localhost:9515");
    assert!(cfg.headless);
    assert_eq!(cfg.cookie_path, PathBuf::from("./amazon_cookies.json"));
    assert_eq!(cfg.output_dir, PathBuf::from("output"));
    assert_eq!(cfg.output_format, OutputFormat::Both);
    assert!(cfg.locators_path.is_none());
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.top_count, 3);
    assert_eq!(cfg.max_pages, 2);
    assert_eq!(cfg.login_timeout_secs, 180);
    assert_eq!(cfg.login_poll_secs, 5);
    assert_eq!(cfg.page_settle_ms, 3000);
    assert_eq!(cfg.filter_settle_ms, 2000);
    assert_eq!(cfg.min_delay_ms, 2000);
    assert_eq!(cfg.max_delay_ms, 5000);
    assert!(cfg.credentials.is_none());
}

#[test]
fn build_app_config_strips_trailing_slashes_from_urls() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_BASE_URL", "https://www.amazon.co.uk/");
    map.insert("REVCRAWL_WEBDRIVER_URL", "http://127.0.0.1:4444/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.base_url, "https://www.amazon.co.uk");
    assert_eq!(cfg.webdriver_url, "http://127.0.0.1:4444");
}

#[test]
fn build_app_config_parses_headless_variants() {
    for (raw, expected) in [("false", false), ("0", false), ("YES", true), ("off", false)] {
        let mut map = HashMap::new();
        map.insert("REVCRAWL_HEADLESS", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.headless, expected, "raw value {raw}");
    }
}

#[test]
fn build_app_config_rejects_invalid_headless() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_HEADLESS", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVCRAWL_HEADLESS"),
        "expected InvalidEnvVar(REVCRAWL_HEADLESS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_unknown_output_format() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_OUTPUT_FORMAT", "xml");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVCRAWL_OUTPUT_FORMAT"),
        "expected InvalidEnvVar(REVCRAWL_OUTPUT_FORMAT), got: {result:?}"
    );
}

#[test]
fn build_app_config_accepts_output_format_case_insensitively() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_OUTPUT_FORMAT", "JSON");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.output_format, OutputFormat::Json);
}

#[test]
fn build_app_config_rejects_non_numeric_max_pages() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_MAX_PAGES", "many");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVCRAWL_MAX_PAGES"),
        "expected InvalidEnvVar(REVCRAWL_MAX_PAGES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_inverted_delay_range() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_MIN_DELAY_MS", "6000");
    map.insert("REVCRAWL_MAX_DELAY_MS", "1000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVCRAWL_MIN_DELAY_MS"),
        "expected InvalidEnvVar(REVCRAWL_MIN_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn build_app_config_requires_both_credentials() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_EMAIL", "shopper@example.com");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.credentials.is_none());

    map.insert("REVCRAWL_PASSWORD", "hunter2");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let creds = cfg.credentials.expect("credentials should be set");
    assert_eq!(creds.email, "shopper@example.com");
    assert_eq!(creds.password, "hunter2");
}

#[test]
fn build_app_config_treats_blank_locators_path_as_unset() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_LOCATORS_PATH", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.locators_path.is_none());
}

#[test]
fn debug_output_redacts_password() {
    let mut map = HashMap::new();
    map.insert("REVCRAWL_EMAIL", "shopper@example.com");
    map.insert("REVCRAWL_PASSWORD", "hunter2");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("[redacted]"));

    let creds = format!("{:?}", cfg.credentials.unwrap());
    assert!(!creds.contains("hunter2"));
    assert!(creds.contains("shopper@example.com"));
}
