use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What became of the file download triggered for an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadState {
    /// The download control was clicked; completion was not checked
    Triggered,
    /// A finished file was found in the item directory
    Completed(PathBuf),
    /// The wait elapsed before a finished file appeared
    Unconfirmed,
}

/// Files written for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifacts {
    /// Rendered DOM snapshot
    pub html: PathBuf,

    /// PDF snapshot, absent when the browser cannot print
    pub pdf: Option<PathBuf>,

    pub download: DownloadState,
}

/// One item written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedItem {
    /// Numeric id taken from the item address
    pub item_id: String,

    /// Page title without the site branding
    pub display_name: String,

    /// Directory holding the artifacts
    pub destination: PathBuf,

    pub artifacts: Artifacts,
}

/// Outcome of a finished category crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Directory every item was written below
    pub category_dir: PathBuf,

    /// Listing pages loaded
    pub pages_visited: usize,

    /// Items in the order they were archived
    pub items: Vec<ArchivedItem>,
}

impl CrawlSummary {
    /// Items whose download wait elapsed without a finished file
    pub fn unconfirmed_downloads(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.artifacts.download == DownloadState::Unconfirmed)
            .count()
    }
}
