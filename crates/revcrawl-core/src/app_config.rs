use std::path::PathBuf;
use std::str::FromStr;

/// Which result files a run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Both,
}

impl OutputFormat {
    #[must_use]
    pub fn writes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    #[must_use]
    pub fn writes_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Both => write!(f, "both"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "both" => Ok(OutputFormat::Both),
            other => Err(format!(
                "unknown output format '{other}'; expected json, csv, or both"
            )),
        }
    }
}

/// Account credentials for the non-interactive login flow.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub cookie_path: PathBuf,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub locators_path: Option<PathBuf>,
    pub log_level: String,
    pub top_count: usize,
    pub max_pages: u32,
    pub login_timeout_secs: u64,
    pub login_poll_secs: u64,
    pub page_settle_ms: u64,
    pub filter_settle_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub credentials: Option<Credentials>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("base_url", &self.base_url)
            .field("webdriver_url", &self.webdriver_url)
            .field("headless", &self.headless)
            .field("user_agent", &self.user_agent)
            .field("cookie_path", &self.cookie_path)
            .field("output_dir", &self.output_dir)
            .field("output_format", &self.output_format)
            .field("locators_path", &self.locators_path)
            .field("log_level", &self.log_level)
            .field("top_count", &self.top_count)
            .field("max_pages", &self.max_pages)
            .field("login_timeout_secs", &self.login_timeout_secs)
            .field("login_poll_secs", &self.login_poll_secs)
            .field("page_settle_ms", &self.page_settle_ms)
            .field("filter_settle_ms", &self.filter_settle_ms)
            .field("min_delay_ms", &self.min_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .field(
                "credentials",
                &self.credentials.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
