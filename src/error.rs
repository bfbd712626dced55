//! Error types for ttg-dl
//!
//! Failures fall into a few groups: a login that never completes (fatal, exit
//! code 1), structural defects such as an item link without an id, invalid
//! configuration, and everything the browser or the filesystem reports.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for ttg-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ttg-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Submitting the login form did not lead to a navigation in time
    #[error("login did not complete within {}s", waited.as_secs())]
    LoginTimeout {
        /// How long we waited for the post-login navigation
        waited: Duration,
    },

    /// An item address did not contain a numeric id
    #[error("no id in item address: {0}")]
    MissingItemId(String),

    /// A listing link that should lead to an item has no usable address
    #[error("invalid item link {link}: {reason}")]
    InvalidItemLink {
        /// The link's `href`, or its markup when it has none
        link: String,
        /// Why it cannot be followed
        reason: String,
    },

    /// The browser answered a command with something we cannot use
    #[error("unexpected browser response: {0}")]
    InvalidResponse(String),

    /// A selector matched nothing on the current page
    #[error("no element matches selector `{0}`")]
    ElementNotFound(String),

    /// A configuration value is unusable
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// A CSS selector from the configuration failed to parse
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector {
        /// The selector as written in the configuration
        selector: String,
        /// Parser message
        message: String,
    },

    /// None of the WebDriver servers we tried accepted a session
    #[error("no WebDriver server reachable (tried {0})")]
    WebDriverUnavailable(String),

    /// A WebDriver command failed
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    /// A WebDriver session could not be created
    #[error("WebDriver session error: {0}")]
    NewSession(#[from] fantoccini::error::NewSessionError),

    /// A URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The item id pattern failed to compile
    #[error("invalid item id pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration JSON could not be read
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error: 1 for a failed login, 2 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::LoginTimeout { .. } => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let login = Error::LoginTimeout {
            waited: Duration::from_secs(120),
        };
        assert_eq!(login.exit_code(), 1);
        assert_eq!(login.to_string(), "login did not complete within 120s");

        let missing = Error::MissingItemId("https://example.com/x".to_string());
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(
            missing.to_string(),
            "no id in item address: https://example.com/x"
        );

        let io = Error::from(std::io::Error::other("disk full"));
        assert_eq!(io.exit_code(), 2);
    }
}
