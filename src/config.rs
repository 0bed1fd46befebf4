//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::scrape::ScrollConfig;
use crate::sites::Site;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target site
    #[serde(default)]
    pub site: Site,

    /// WebDriver endpoint (chromedriver)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window
    #[serde(default)]
    pub headless: bool,

    /// Chrome user-data directory, for a logged-in affiliate profile
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,

    /// Profile name inside the user-data directory
    #[serde(default)]
    pub profile_name: Option<String>,

    /// Directory for exported spreadsheets and failure screenshots
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Spreadsheet header language
    #[serde(default)]
    pub header_locale: HeaderLocale,

    /// Structural wait ceiling in seconds
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,

    /// Shorter wait for optional elements (share flow)
    #[serde(default = "default_short_wait_secs")]
    pub short_wait_secs: u64,

    /// Hard ceiling on scroll-to-load attempts
    #[serde(default = "default_scroll_max_attempts")]
    pub scroll_max_attempts: usize,

    /// Unchanged-height readings required to stop scrolling early
    #[serde(default = "default_scroll_settle_streak")]
    pub scroll_settle_streak: usize,

    /// Pause between scroll attempts in milliseconds
    #[serde(default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,

    /// Maximum description length in characters
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    /// Stop after the listing pass (no product visits)
    #[serde(default)]
    pub skip_details: bool,

    /// Base delay between product visits in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to the delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Cell value for listing fields the parser could not extract
    #[serde(default = "default_missing_value")]
    pub missing_value: String,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_wait_secs() -> u64 {
    30
}

fn default_short_wait_secs() -> u64 {
    15
}

fn default_scroll_max_attempts() -> usize {
    30
}

fn default_scroll_settle_streak() -> usize {
    3
}

fn default_scroll_pause_ms() -> u64 {
    1500
}

fn default_description_limit() -> usize {
    500
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    3000
}

fn default_missing_value() -> String {
    "not found".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: Site::MercadoLivre,
            webdriver_url: default_webdriver_url(),
            headless: false,
            profile_dir: None,
            profile_name: None,
            output_dir: default_output_dir(),
            header_locale: HeaderLocale::Pt,
            wait_secs: default_wait_secs(),
            short_wait_secs: default_short_wait_secs(),
            scroll_max_attempts: default_scroll_max_attempts(),
            scroll_settle_streak: default_scroll_settle_streak(),
            scroll_pause_ms: default_scroll_pause_ms(),
            description_limit: default_description_limit(),
            skip_details: false,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            missing_value: default_missing_value(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("deals-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(site) = std::env::var("DEALS_SITE") {
            if let Ok(s) = site.parse() {
                self.site = s;
            }
        }

        if let Ok(url) = std::env::var("DEALS_WEBDRIVER_URL") {
            self.webdriver_url = url;
        }

        if let Ok(headless) = std::env::var("DEALS_HEADLESS") {
            if let Ok(h) = headless.parse() {
                self.headless = h;
            }
        }

        if let Ok(delay) = std::env::var("DEALS_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        self
    }

    /// Structural wait ceiling.
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    /// Wait for optional elements.
    pub fn short_wait(&self) -> Duration {
        Duration::from_secs(self.short_wait_secs)
    }

    /// Scroll controller settings.
    pub fn scroll(&self) -> ScrollConfig {
        ScrollConfig {
            max_attempts: self.scroll_max_attempts,
            settle_streak: self.scroll_settle_streak,
            pause: Duration::from_millis(self.scroll_pause_ms),
        }
    }
}

/// Spreadsheet header language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderLocale {
    /// Portuguese headers, matching the sheets the affiliate workflow expects.
    #[default]
    Pt,
    /// English headers derived from the record field names.
    En,
}

impl std::str::FromStr for HeaderLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt" | "pt-br" | "portuguese" => Ok(HeaderLocale::Pt),
            "en" | "english" => Ok(HeaderLocale::En),
            _ => Err(format!("Unknown header locale: {}. Use: pt, en", s)),
        }
    }
}

impl std::fmt::Display for HeaderLocale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderLocale::Pt => write!(f, "pt"),
            HeaderLocale::En => write!(f, "en"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site, Site::MercadoLivre);
        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert!(!config.headless);
        assert!(config.profile_dir.is_none());
        assert!(config.profile_name.is_none());
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.header_locale, HeaderLocale::Pt);
        assert_eq!(config.wait_secs, 30);
        assert_eq!(config.short_wait_secs, 15);
        assert_eq!(config.scroll_max_attempts, 30);
        assert_eq!(config.scroll_settle_streak, 3);
        assert_eq!(config.scroll_pause_ms, 1500);
        assert_eq!(config.description_limit, 500);
        assert!(!config.skip_details);
        assert_eq!(config.delay_ms, 2000);
        assert_eq!(config.delay_jitter_ms, 3000);
        assert_eq!(config.missing_value, "not found");
    }

    #[test]
    fn test_duration_accessors() {
        let config = Config::default();
        assert_eq!(config.wait(), Duration::from_secs(30));
        assert_eq!(config.short_wait(), Duration::from_secs(15));

        let scroll = config.scroll();
        assert_eq!(scroll.max_attempts, 30);
        assert_eq!(scroll.settle_streak, 3);
        assert_eq!(scroll.pause, Duration::from_millis(1500));
    }

    #[test]
    fn test_header_locale_parsing() {
        assert_eq!("pt".parse::<HeaderLocale>().unwrap(), HeaderLocale::Pt);
        assert_eq!("PT-BR".parse::<HeaderLocale>().unwrap(), HeaderLocale::Pt);
        assert_eq!("en".parse::<HeaderLocale>().unwrap(), HeaderLocale::En);
        assert_eq!("English".parse::<HeaderLocale>().unwrap(), HeaderLocale::En);

        let err = "fr".parse::<HeaderLocale>().unwrap_err();
        assert!(err.contains("Unknown header locale"));
    }

    #[test]
    fn test_header_locale_display() {
        assert_eq!(HeaderLocale::Pt.to_string(), "pt");
        assert_eq!(HeaderLocale::En.to_string(), "en");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            site = "amazon-br"
            headless = true
            scroll_max_attempts = 10
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.site, Site::AmazonBr);
        assert!(config.headless);
        assert_eq!(config.scroll_max_attempts, 10);
        // Unset fields keep their defaults
        assert_eq!(config.wait_secs, 30);
    }

    #[test]
    fn test_config_from_toml_all_fields() {
        let toml = r#"
            site = "mercado-livre"
            webdriver_url = "http://driver-host:4444"
            headless = true
            profile_dir = "/home/user/.config/google-chrome"
            profile_name = "Profile 2"
            output_dir = "/tmp/deals"
            header_locale = "en"
            wait_secs = 45
            short_wait_secs = 10
            scroll_max_attempts = 20
            scroll_settle_streak = 2
            scroll_pause_ms = 800
            description_limit = 300
            skip_details = true
            delay_ms = 1000
            delay_jitter_ms = 500
            missing_value = "n/a"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.site, Site::MercadoLivre);
        assert_eq!(config.webdriver_url, "http://driver-host:4444");
        assert!(config.headless);
        assert_eq!(
            config.profile_dir,
            Some(PathBuf::from("/home/user/.config/google-chrome"))
        );
        assert_eq!(config.profile_name, Some("Profile 2".to_string()));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/deals"));
        assert_eq!(config.header_locale, HeaderLocale::En);
        assert_eq!(config.wait_secs, 45);
        assert_eq!(config.short_wait_secs, 10);
        assert_eq!(config.scroll_max_attempts, 20);
        assert_eq!(config.scroll_settle_streak, 2);
        assert_eq!(config.scroll_pause_ms, 800);
        assert_eq!(config.description_limit, 300);
        assert!(config.skip_details);
        assert_eq!(config.delay_ms, 1000);
        assert_eq!(config.delay_jitter_ms, 500);
        assert_eq!(config.missing_value, "n/a");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            site = "amazon-br"
            delay_ms = 4000
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.site, Site::AmazonBr);
        assert_eq!(config.delay_ms, 4000);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let result = Config::from_file(file.path());
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            site = "amazon-br"
            skip_details = true
            "#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.site, Site::AmazonBr);
        assert!(config.skip_details);
    }

    #[test]
    fn test_config_with_env() {
        // Save original env vars
        let orig_site = std::env::var("DEALS_SITE").ok();
        let orig_url = std::env::var("DEALS_WEBDRIVER_URL").ok();
        let orig_delay = std::env::var("DEALS_DELAY").ok();

        std::env::set_var("DEALS_SITE", "amazon-br");
        std::env::set_var("DEALS_WEBDRIVER_URL", "http://proxy-driver:9515");
        std::env::set_var("DEALS_DELAY", "5000");

        let config = Config::new().with_env();
        assert_eq!(config.site, Site::AmazonBr);
        assert_eq!(config.webdriver_url, "http://proxy-driver:9515");
        assert_eq!(config.delay_ms, 5000);

        // Restore original env vars
        match orig_site {
            Some(v) => std::env::set_var("DEALS_SITE", v),
            None => std::env::remove_var("DEALS_SITE"),
        }
        match orig_url {
            Some(v) => std::env::set_var("DEALS_WEBDRIVER_URL", v),
            None => std::env::remove_var("DEALS_WEBDRIVER_URL"),
        }
        match orig_delay {
            Some(v) => std::env::set_var("DEALS_DELAY", v),
            None => std::env::remove_var("DEALS_DELAY"),
        }
    }

    #[test]
    fn test_config_with_env_invalid_values() {
        let orig_site = std::env::var("DEALS_SITE").ok();
        let orig_delay = std::env::var("DEALS_DELAY").ok();

        std::env::set_var("DEALS_SITE", "ebay");
        std::env::set_var("DEALS_DELAY", "not_a_number");

        let config = Config::new().with_env();
        // Invalid values should be ignored, keeping defaults
        assert_eq!(config.site, Site::MercadoLivre);
        assert_eq!(config.delay_ms, 2000);

        match orig_site {
            Some(v) => std::env::set_var("DEALS_SITE", v),
            None => std::env::remove_var("DEALS_SITE"),
        }
        match orig_delay {
            Some(v) => std::env::set_var("DEALS_DELAY", v),
            None => std::env::remove_var("DEALS_DELAY"),
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            site: Site::AmazonBr,
            headless: true,
            profile_name: Some("Default".to_string()),
            header_locale: HeaderLocale::En,
            skip_details: true,
            ..Config::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.site, config.site);
        assert_eq!(parsed.headless, config.headless);
        assert_eq!(parsed.profile_name, config.profile_name);
        assert_eq!(parsed.header_locale, config.header_locale);
        assert_eq!(parsed.skip_details, config.skip_details);
        assert_eq!(parsed.missing_value, config.missing_value);
    }
}
