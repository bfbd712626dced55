use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Placeholder in `listing_path` replaced by the category id
pub const CATEGORY_PLACEHOLDER: &str = "{id}";

/// CSS selectors for the site elements the archiver interacts with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Selectors {
    /// Login form username input
    pub username: String,

    /// Login form password input
    pub password: String,

    /// Login form submit button
    pub login_submit: String,

    /// Anchors on a listing page that lead to an item
    pub item_link: String,

    /// The "next page" control of a listing page
    pub next_page: String,

    /// Account/profile navigation removed before snapshotting an item
    pub profile_nav: String,

    /// The download control on an item page
    pub download_button: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            username: "#username".to_string(),
            password: "#password".to_string(),
            login_submit: r#"#buttons > button[type="submit"]"#.to_string(),
            item_link: "a.forumlink[title=Download]".to_string(),
            next_page: r#"a[title="Next page"]"#.to_string(),
            profile_nav: r#"a[title="Manage your profile"]"#.to_string(),
            download_button: "#buttons > button[title=Download]".to_string(),
        }
    }
}

/// Configuration for a category archive run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiverConfig {
    /// Site root every path below is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the account/login page
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Path of a category listing, `{id}` is replaced by the category id
    #[serde(default = "default_listing_path")]
    pub listing_path: String,

    /// Branding stripped from the end of an item page title
    #[serde(default = "default_title_suffix")]
    pub title_suffix: String,

    /// Regex whose first group captures the item id from an item address
    #[serde(default = "default_item_id_pattern")]
    pub item_id_pattern: String,

    /// How long to wait for the navigation that follows a login
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,

    /// How long to wait for a triggered download to land (0 = don't wait)
    #[serde(default)]
    pub download_wait_secs: u64,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Element selectors
    #[serde(default)]
    pub selectors: Selectors,
}

fn default_base_url() -> String {
    "https://www.thetechgame.com".to_string()
}

fn default_login_path() -> String {
    "/Account.html".to_string()
}

fn default_listing_path() -> String {
    "/Downloads/cid={id}.html".to_string()
}

fn default_title_suffix() -> String {
    " - The Tech Game".to_string()
}

fn default_item_id_pattern() -> String {
    r"/id=(\d+)/".to_string()
}

fn default_login_timeout_secs() -> u64 {
    120
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            listing_path: default_listing_path(),
            title_suffix: default_title_suffix(),
            item_id_pattern: default_item_id_pattern(),
            login_timeout_secs: default_login_timeout_secs(),
            download_wait_secs: 0,
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            selectors: Selectors::default(),
        }
    }
}

impl ArchiverConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Address of the login page
    pub fn login_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.base_url)?.join(&self.login_path)?)
    }

    /// Address of the first listing page of a category
    pub fn listing_url(&self, category_id: &str) -> Result<Url> {
        let path = self.listing_path.replace(CATEGORY_PLACEHOLDER, category_id);
        Ok(Url::parse(&self.base_url)?.join(&path)?)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn download_wait(&self) -> Option<Duration> {
        (self.download_wait_secs > 0).then(|| Duration::from_secs(self.download_wait_secs))
    }

    /// Compile the item id pattern, requiring one capture group
    pub fn item_id_regex(&self) -> Result<Regex> {
        let regex = Regex::new(&self.item_id_pattern)?;
        if regex.captures_len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "item_id_pattern `{}` has no capture group",
                self.item_id_pattern
            )));
        }
        Ok(regex)
    }

    /// Check every value that could otherwise fail halfway through a crawl
    pub fn validate(&self) -> Result<()> {
        self.login_url()?;
        if !self.listing_path.contains(CATEGORY_PLACEHOLDER) {
            return Err(Error::InvalidConfig(format!(
                "listing_path `{}` does not contain {}",
                self.listing_path, CATEGORY_PLACEHOLDER
            )));
        }
        if self.login_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "login_timeout_secs must be positive".to_string(),
            ));
        }
        self.item_id_regex()?;

        let s = &self.selectors;
        for selector in [
            &s.username,
            &s.password,
            &s.login_submit,
            &s.item_link,
            &s.next_page,
            &s.profile_nav,
            &s.download_button,
        ] {
            crate::parsers::html::compile_selector(selector)?;
        }
        Ok(())
    }
}
