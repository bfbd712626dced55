//! Signing in to the site.
//!
//! A [`Session`] can only be obtained through [`Session::establish`], so code
//! that takes one can rely on the browser carrying a logged-in account.

use crate::browser::Browser;
use crate::config::ArchiverConfig;
use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Interval between document checks while waiting for a navigation
const NAVIGATION_POLL: Duration = Duration::from_millis(250);

/// Username and password supplied by the operator
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated browser
#[derive(Debug)]
pub struct Session<B> {
    browser: B,
}

impl<B: Browser> Session<B> {
    /// Logs in through the account page.
    ///
    /// Fills the username and password fields, then clicks submit while
    /// waiting for the login document to be replaced by a new one, possibly
    /// at the same address. If no navigation happens within
    /// `login_timeout_secs` the credentials are assumed wrong and [`Error::LoginTimeout`] is returned, whatever became
    /// of the click. Other failures are returned as they are. On failure the
    /// browser is quit before returning.
    pub async fn establish(
        browser: B,
        credentials: &Credentials,
        config: &ArchiverConfig,
    ) -> Result<Self> {
        match sign_in(&browser, credentials, config).await {
            Ok(landed) => {
                ::log::info!("Signed in, landed on {}", landed);
                Ok(Self { browser })
            }
            Err(e) => {
                if let Err(quit_err) = browser.quit().await {
                    ::log::warn!("Failed to close browser after sign-in error: {}", quit_err);
                }
                Err(e)
            }
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn into_browser(self) -> B {
        self.browser
    }
}

async fn sign_in<B: Browser>(
    browser: &B,
    credentials: &Credentials,
    config: &ArchiverConfig,
) -> Result<Url> {
    let login_url = config.login_url()?;
    ::log::info!("Signing in as {} at {}", credentials.username, login_url);

    browser.goto(&login_url).await?;
    let login_document = browser.document_id().await?;

    let selectors = &config.selectors;
    browser.fill(&selectors.username, &credentials.username).await?;
    browser.fill(&selectors.password, &credentials.password).await?;

    let waited = config.login_timeout();
    let submit_and_wait = async {
        tokio::try_join!(
            browser.click(&selectors.login_submit),
            wait_for_navigation(browser, &login_document),
        )
    };

    match timeout(waited, submit_and_wait).await {
        Ok(Ok((_, landed))) => Ok(landed),
        Ok(Err(e)) => Err(e),
        Err(_) => {
            ::log::warn!("No navigation within {:?} of submitting the login form", waited);
            Err(Error::LoginTimeout { waited })
        }
    }
}

/// Resolves with the new address once the focused tab holds a document other than `from`
pub async fn wait_for_navigation<B: Browser>(browser: &B, from: &str) -> Result<Url> {
    loop {
        tokio::time::sleep(NAVIGATION_POLL).await;
        match browser.document_id().await {
            Ok(current) if current != from => return browser.current_url().await,
            Ok(_) => {}
            // Scripts can fail while the old document unloads
            Err(Error::WebDriver(e)) => ::log::debug!("Document check failed: {}", e),
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("alice", "hunter2");
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }
}
