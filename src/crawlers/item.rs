use crate::browser::{Browser, PdfCapture};
use crate::config::ArchiverConfig;
use crate::error::{Error, Result};
use crate::parsers::{self, html};
use crate::paths;
use crate::results::{ArchivedItem, Artifacts, DownloadState};
use regex::Regex;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use url::Url;

pub const HTML_ARTIFACT: &str = "page.html";
pub const PDF_ARTIFACT: &str = "page.pdf";

/// Suffixes browsers give files that are still being written
const PARTIAL_DOWNLOAD_SUFFIXES: &[&str] = &[".crdownload", ".part", ".tmp"];

const DOWNLOAD_POLL: Duration = Duration::from_millis(500);

/// Modification time of every file in a directory, by name
type DirSnapshot = HashMap<OsString, SystemTime>;

/// Extracts the numeric item id from an item address
pub fn identify(address: &Url, pattern: &Regex) -> Result<String> {
    pattern
        .captures(address.as_str())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::MissingItemId(address.to_string()))
}

/// Writes the artifacts of single items below one category directory
pub struct ItemArchiver<'a, B> {
    browser: &'a B,
    config: &'a ArchiverConfig,
    category_dir: PathBuf,
    id_pattern: Regex,
}

impl<'a, B: Browser> ItemArchiver<'a, B> {
    pub fn new(browser: &'a B, config: &'a ArchiverConfig, category_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            browser,
            config,
            category_dir,
            id_pattern: config.item_id_regex()?,
        })
    }

    pub fn category_dir(&self) -> &Path {
        &self.category_dir
    }

    /// Archives the item at `address` in its own tab.
    ///
    /// Files land in `<category_dir>/<name> [<id>]/`; an existing directory
    /// is reused and its files overwritten.
    pub async fn archive(&self, address: &Url) -> Result<ArchivedItem> {
        let item_id = identify(address, &self.id_pattern)?;

        let tab = self.browser.open_tab().await?;
        self.browser.goto(address).await?;

        let removed = self
            .browser
            .remove_elements(&self.config.selectors.profile_nav)
            .await?;
        ::log::debug!("Removed {} profile elements from {}", removed, address);

        let source = self.browser.source().await?;
        let title = html::parse_title(&source).unwrap_or_default();
        let display_name = parsers::item_name(&title, &self.config.title_suffix);

        let destination = paths::item_dir(&self.category_dir, &display_name, &item_id);
        paths::ensure_dir(&destination).await?;

        let html_path = destination.join(HTML_ARTIFACT);
        tokio::fs::write(&html_path, &source).await?;
        ::log::debug!("Wrote {}", html_path.display());

        let pdf = match self.browser.print_pdf().await? {
            PdfCapture::Rendered(bytes) => {
                let pdf_path = destination.join(PDF_ARTIFACT);
                tokio::fs::write(&pdf_path, bytes).await?;
                ::log::debug!("Wrote {}", pdf_path.display());
                Some(pdf_path)
            }
            PdfCapture::Unsupported => {
                ::log::debug!("Skipping PDF for {}: printing unsupported", item_id);
                None
            }
        };

        self.browser.set_download_dir(&destination).await?;
        // Files from earlier runs must not count as this run's download
        let before = snapshot_files(&destination).await?;
        self.browser
            .click(&self.config.selectors.download_button)
            .await?;

        let download = match self.config.download_wait() {
            Some(limit) => await_download(&destination, &before, limit).await?,
            None => {
                ::log::debug!("Download for {} triggered, not waiting for it", item_id);
                DownloadState::Triggered
            }
        };

        self.browser.close_tab(tab).await?;

        println!("Downloaded: {}", display_name);
        ::log::info!("Archived item {} to {}", item_id, destination.display());

        Ok(ArchivedItem {
            item_id,
            display_name,
            destination,
            artifacts: Artifacts {
                html: html_path,
                pdf,
                download,
            },
        })
    }
}

/// Records what `dir` holds before a download is started
async fn snapshot_files(dir: &Path) -> Result<DirSnapshot> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut snapshot = DirSnapshot::new();

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            snapshot.insert(entry.file_name(), metadata.modified()?);
        }
    }
    Ok(snapshot)
}

/// Polls `dir` until a finished download sits next to the page snapshots
async fn await_download(dir: &Path, before: &DirSnapshot, limit: Duration) -> Result<DownloadState> {
    let waited = tokio::time::timeout(limit, async {
        loop {
            if let Some(file) = finished_download(dir, before).await? {
                return Ok::<_, Error>(file);
            }
            tokio::time::sleep(DOWNLOAD_POLL).await;
        }
    })
    .await;

    match waited {
        Ok(file) => {
            let file = file?;
            ::log::debug!("Download finished: {}", file.display());
            Ok(DownloadState::Completed(file))
        }
        Err(_) => {
            ::log::warn!(
                "No finished download in {} after {:?}",
                dir.display(),
                limit
            );
            Ok(DownloadState::Unconfirmed)
        }
    }
}

/// A file in `dir` created or rewritten since `before` was taken, if one
/// exists and no fresh download is still in progress
async fn finished_download(dir: &Path, before: &DirSnapshot) -> Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut finished = None;

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if name == HTML_ARTIFACT || name == PDF_ARTIFACT {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if before.get(&file_name).is_some_and(|seen| modified <= *seen) {
            continue;
        }
        if PARTIAL_DOWNLOAD_SUFFIXES
            .iter()
            .any(|suffix| name.ends_with(suffix))
        {
            return Ok(None);
        }
        finished = Some(entry.path());
    }
    Ok(finished)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Regex {
        ArchiverConfig::default().item_id_regex().unwrap()
    }

    #[test]
    fn test_identify_extracts_digits() {
        let address = Url::parse("https://www.thetechgame.com/Downloads/id=12345/cool-mod.html").unwrap();
        assert_eq!(identify(&address, &pattern()).unwrap(), "12345");

        let address = Url::parse("https://example.com/a/id=7/b/id=8/c").unwrap();
        assert_eq!(identify(&address, &pattern()).unwrap(), "7");
    }

    #[test]
    fn test_identify_fails_without_id() {
        for address in [
            "https://www.thetechgame.com/Downloads/cid=42.html",
            "https://www.thetechgame.com/Downloads/id=/empty.html",
            "https://www.thetechgame.com/Downloads/id=12ab/mixed.html",
            "https://www.thetechgame.com/Downloads/id=12345",
        ] {
            let address = Url::parse(address).unwrap();
            assert!(matches!(
                identify(&address, &pattern()),
                Err(Error::MissingItemId(_))
            ));
        }
    }

    /// Sets the modification time of `path` an hour back
    fn age(path: &Path) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();
    }

    #[tokio::test]
    async fn test_finished_download_detection() {
        let dir = tempfile::tempdir().unwrap();
        let before = DirSnapshot::new();
        std::fs::write(dir.path().join(HTML_ARTIFACT), "<html></html>").unwrap();
        assert_eq!(finished_download(dir.path(), &before).await.unwrap(), None);

        std::fs::write(dir.path().join("mod.zip.crdownload"), "partial").unwrap();
        assert_eq!(finished_download(dir.path(), &before).await.unwrap(), None);

        std::fs::remove_file(dir.path().join("mod.zip.crdownload")).unwrap();
        std::fs::write(dir.path().join("mod.zip"), "done").unwrap();
        assert_eq!(
            finished_download(dir.path(), &before).await.unwrap(),
            Some(dir.path().join("mod.zip"))
        );
    }

    #[tokio::test]
    async fn test_file_from_earlier_run_is_not_a_download() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("mod.zip");
        std::fs::write(&stale, "old").unwrap();
        age(&stale);
        let leftover = dir.path().join("other.zip.crdownload");
        std::fs::write(&leftover, "abandoned").unwrap();
        age(&leftover);

        let before = snapshot_files(dir.path()).await.unwrap();
        assert_eq!(before.len(), 2);
        assert_eq!(finished_download(dir.path(), &before).await.unwrap(), None);

        let state = await_download(dir.path(), &before, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(state, DownloadState::Unconfirmed);
    }

    #[tokio::test]
    async fn test_rewritten_file_counts_as_download() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mod.zip");
        std::fs::write(&file, "old").unwrap();
        age(&file);
        let before = snapshot_files(dir.path()).await.unwrap();

        std::fs::write(&file, "new").unwrap();
        assert_eq!(
            finished_download(dir.path(), &before).await.unwrap(),
            Some(file)
        );
    }

    #[tokio::test]
    async fn test_await_download_gives_up() {
        let dir = tempfile::tempdir().unwrap();
        let state = await_download(dir.path(), &DirSnapshot::new(), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(state, DownloadState::Unconfirmed);
    }
}
