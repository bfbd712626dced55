//! Browser automation seam.
//!
//! The session, crawler and archiver only talk to a [`Browser`]; the
//! production implementation drives a WebDriver server through fantoccini.

pub mod webdriver;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use url::Url;

pub use webdriver::WebDriverBrowser;

/// Outcome of an optional capture capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfCapture {
    /// The page was rendered to PDF bytes
    Rendered(Vec<u8>),
    /// The browser cannot print in its current mode (e.g. a visible window)
    Unsupported,
}

/// One authenticated browsing process with tabs that share its cookies.
///
/// Every method acts on the focused tab. Navigation and clicks return once
/// the resulting document is parsed (DOM ready).
#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle to a tab opened with [`Browser::open_tab`]
    type Tab: Send + Sync;

    async fn goto(&self, url: &Url) -> Result<()>;

    async fn current_url(&self) -> Result<Url>;

    /// Identifier of the document loaded in the focused tab; changes with
    /// every navigation, also when the new document has the same address
    async fn document_id(&self) -> Result<String>;

    /// Serialized rendered DOM of the focused tab
    async fn source(&self) -> Result<String>;

    /// Types `text` into the first element matching `selector`
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Clicks the first element matching `selector`
    async fn click(&self, selector: &str) -> Result<()>;

    /// Removes every element matching `selector`, returning how many there were
    async fn remove_elements(&self, selector: &str) -> Result<usize>;

    async fn print_pdf(&self) -> Result<PdfCapture>;

    /// Saves downloads started from the focused tab into `dir`
    async fn set_download_dir(&self, dir: &Path) -> Result<()>;

    /// Opens a blank tab and focuses it
    async fn open_tab(&self) -> Result<Self::Tab>;

    /// Closes `tab` and focuses the tab that was active when it was opened
    async fn close_tab(&self, tab: Self::Tab) -> Result<()>;

    /// Ends the browsing process
    async fn quit(&self) -> Result<()>;
}
