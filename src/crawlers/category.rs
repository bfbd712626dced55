use crate::browser::Browser;
use crate::config::ArchiverConfig;
use crate::crawlers::item::ItemArchiver;
use crate::error::Result;
use crate::parsers::ListingParser;
use crate::paths;
use crate::results::CrawlSummary;
use crate::session::Session;
use std::path::Path;

/// Archives every item of a category, page by page.
///
/// Items are archived one at a time in the order their links appear, and
/// pages are followed through the site's own "next page" control until a
/// page has none. The browser is quit afterwards, also when the crawl
/// fails; the crawl error is the one returned.
pub async fn crawl<B: Browser>(
    session: Session<B>,
    category_id: &str,
    config: &ArchiverConfig,
    output_root: &Path,
) -> Result<CrawlSummary> {
    let outcome = crawl_pages(&session, category_id, config, output_root).await;
    let browser = session.into_browser();

    match outcome {
        Ok(summary) => {
            browser.quit().await?;
            println!("{}", completion_message(&summary));
            let unconfirmed = summary.unconfirmed_downloads();
            if unconfirmed > 0 {
                println!("Warning: {} downloads could not be confirmed as finished.", unconfirmed);
            }
            Ok(summary)
        }
        Err(e) => {
            if let Err(quit_err) = browser.quit().await {
                ::log::warn!("Failed to close browser after crawl error: {}", quit_err);
            }
            Err(e)
        }
    }
}

/// Closing line naming the category directory as it appears under the output root
pub fn completion_message(summary: &CrawlSummary) -> String {
    let dir = summary
        .category_dir
        .file_name()
        .unwrap_or(summary.category_dir.as_os_str());
    format!(
        "Everything is downloaded! Saved to directory '{}'.",
        dir.to_string_lossy()
    )
}

async fn crawl_pages<B: Browser>(
    session: &Session<B>,
    category_id: &str,
    config: &ArchiverConfig,
    output_root: &Path,
) -> Result<CrawlSummary> {
    let browser = session.browser();
    let listing = ListingParser::new(&config.selectors)?;
    let archiver = ItemArchiver::new(
        browser,
        config,
        paths::category_dir(output_root, category_id),
    )?;

    let start_url = config.listing_url(category_id)?;
    ::log::info!("Crawling category {} from {}", category_id, start_url);
    browser.goto(&start_url).await?;

    let mut pages_visited = 1;
    let mut items = Vec::new();

    loop {
        let page_url = browser.current_url().await?;
        let source = browser.source().await?;
        let page = listing.parse(&source, &page_url)?;
        ::log::info!(
            "Found {} items on page {} ({})",
            page.item_links.len(),
            pages_visited,
            page_url
        );

        for address in &page.item_links {
            items.push(archiver.archive(address).await?);
        }

        if !page.has_next {
            ::log::debug!("No next page after {}", page_url);
            break;
        }

        browser.click(&config.selectors.next_page).await?;
        pages_visited += 1;
    }

    ::log::info!(
        "Crawling complete - archived {} items from {} pages",
        items.len(),
        pages_visited
    );

    Ok(CrawlSummary {
        category_dir: archiver.category_dir().to_path_buf(),
        pages_visited,
        items,
    })
}
