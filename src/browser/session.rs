//! WebDriver session construction.
//!
//! All browser options are collected into one immutable [`BrowserConfig`]
//! built before the session starts; nothing mutates it afterwards.

use crate::browser::LivePage;
use crate::config::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thirtyfour::prelude::*;
use tracing::{debug, info};

/// Script run after every navigation to mask the automation fingerprint.
pub const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['pt-BR', 'pt', 'en'] });
window.chrome = window.chrome || { runtime: {} };
"#;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Immutable browser session options.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// WebDriver server endpoint.
    pub webdriver_url: String,
    /// Run without a visible window.
    pub headless: bool,
    /// Browser window size.
    pub window_size: (u32, u32),
    /// User agent presented to the sites.
    pub user_agent: String,
    /// Chrome user-data directory, for session persistence.
    pub profile_dir: Option<PathBuf>,
    /// Named profile inside the user-data directory.
    pub profile_name: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            window_size: (1920, 1080),
            user_agent: USER_AGENT.to_string(),
            profile_dir: None,
            profile_name: None,
        }
    }
}

impl BrowserConfig {
    /// Builds the browser options from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
            profile_dir: config.profile_dir.clone(),
            profile_name: config.profile_name.clone(),
            ..Self::default()
        }
    }
}

/// A live browser session.
pub struct Session {
    driver: WebDriver,
}

impl Session {
    /// Starts a WebDriver session with anti-detection options applied.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        info!("Starting browser session at {}", config.webdriver_url);

        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--start-maximized")?;
        caps.add_arg("--disable-blink-features=AutomationControlled")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;
        caps.add_arg("--disable-extensions")?;
        caps.add_arg("--disable-notifications")?;
        caps.add_arg("--disable-popup-blocking")?;
        caps.add_arg(&format!(
            "--window-size={},{}",
            config.window_size.0, config.window_size.1
        ))?;
        caps.add_arg(&format!("--user-agent={}", config.user_agent))?;

        if config.headless {
            caps.add_arg("--headless=new")?;
        }

        if let Some(dir) = &config.profile_dir {
            debug!("Using browser profile at {}", dir.display());
            caps.add_arg(&format!("--user-data-dir={}", dir.display()))?;
            if let Some(name) = &config.profile_name {
                caps.add_arg(&format!("--profile-directory={}", name))?;
            }
        }

        caps.add_experimental_option("excludeSwitches", ["enable-automation"])?;
        caps.add_experimental_option("useAutomationExtension", false)?;

        let driver = WebDriver::new(&config.webdriver_url, caps)
            .await
            .context("failed to connect to the WebDriver server")?;

        info!("Browser session ready");
        Ok(Self { driver })
    }

    /// Returns a page handle for the session's window.
    pub fn page(&self) -> LivePage {
        LivePage::new(self.driver.clone())
    }

    /// Closes the browser session.
    pub async fn quit(self) -> Result<()> {
        info!("Closing browser session");
        self.driver.quit().await.context("failed to close the browser session")
    }
}

/// Builds a timestamped screenshot path under `dir`.
pub fn screenshot_path(dir: &Path, base_name: &str) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.png", base_name, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_browser_config() {
        let config = BrowserConfig::default();
        assert_eq!(config.webdriver_url, "http://localhost:9515");
        assert!(!config.headless);
        assert_eq!(config.window_size, (1920, 1080));
        assert!(config.profile_dir.is_none());
        assert!(config.user_agent.contains("Chrome"));
    }

    #[test]
    fn test_screenshot_path_shape() {
        let path = screenshot_path(Path::new("/tmp"), "error_category_MLB1367");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("error_category_MLB1367_"));
        assert!(name.ends_with(".png"));
    }
}
