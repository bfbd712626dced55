pub mod html;


use crate::config::Selectors;
use crate::error::Result;
use scraper::Selector;
use url::Url;

/// What a listing page offers: item addresses and whether another page follows
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    /// Fully-qualified item addresses in page order
    pub item_links: Vec<Url>,
    /// A "next page" control is present
    pub has_next: bool,
}

/// Compiled extraction rules for category listing pages
#[derive(Debug)]
pub struct ListingParser {
    item_link: Selector,
    next_page: Selector,
}

impl ListingParser {
    pub fn new(selectors: &Selectors) -> Result<Self> {
        Ok(Self {
            item_link: html::compile_selector(&selectors.item_link)?,
            next_page: html::compile_selector(&selectors.next_page)?,
        })
    }

    /// Parses the rendered source of the listing page found at `page_url`
    pub fn parse(&self, source: &str, page_url: &Url) -> Result<ListingPage> {
        Ok(ListingPage {
            item_links: html::parse_links(source, &self.item_link, page_url)?,
            has_next: html::contains(source, &self.next_page),
        })
    }
}

/// Item name from an item page title: the title minus the site branding
pub fn item_name(title: &str, suffix: &str) -> String {
    title.strip_suffix(suffix).unwrap_or(title).trim().to_string()
}
