pub mod browser;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod parsers;
pub mod paths;
pub mod results;
pub mod session;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use browser::{Browser, PdfCapture, WebDriverBrowser};
pub use config::ArchiverConfig;
pub use error::{Error, Result};
pub use results::{ArchivedItem, CrawlSummary, DownloadState};
pub use session::{Credentials, Session};

use std::path::PathBuf;

/// Main builder for archiving one download category
#[derive(Debug)]
pub struct CategoryDownload {
    category_id: String,
    config: ArchiverConfig,
    output_root: PathBuf,
}

impl CategoryDownload {
    /// Create a builder for the given category id, writing below the current directory
    pub fn new(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            config: ArchiverConfig::default(),
            output_root: PathBuf::from("."),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: ArchiverConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        let config = ArchiverConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a JSON string
    pub fn with_config_str(self, json: &str) -> Result<Self> {
        let config = ArchiverConfig::from_json(json)?;
        Ok(self.with_config(config))
    }

    /// Directory the category directory is created in
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Override the WebDriver URL
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.config.webdriver_url = url.into();
        self
    }

    /// Run the browser with or without a window
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Wait up to this many seconds for each triggered download (0 = don't wait)
    pub fn with_download_wait(mut self, seconds: u64) -> Self {
        self.config.download_wait_secs = seconds;
        self
    }

    pub fn config(&self) -> &ArchiverConfig {
        &self.config
    }

    /// Start a WebDriver browser, sign in and archive the category
    pub async fn run(self, credentials: &Credentials) -> Result<CrawlSummary> {
        self.config.validate()?;
        let browser = WebDriverBrowser::connect(&self.config).await?;
        self.run_with(browser, credentials).await
    }

    /// Sign in and archive the category with an already running browser
    pub async fn run_with<B: Browser>(
        self,
        browser: B,
        credentials: &Credentials,
    ) -> Result<CrawlSummary> {
        self.config.validate()?;

        let session = match Session::establish(browser, credentials, &self.config).await {
            Ok(session) => session,
            Err(e) => {
                ::log::error!("Sign-in failed: {}", e);
                return Err(e);
            }
        };

        crawlers::category::crawl(session, &self.category_id, &self.config, &self.output_root)
            .await
    }
}
