use crate::error::{Error, Result};
use scraper::{Html, Selector};
use url::Url;

/// Parses a CSS selector, keeping the offending text in the error
pub fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Extracts the `href` of every element matching `selector`, in document order,
/// resolved against `base` so relative links become absolute.
///
/// A matching element without a usable `href` is an error.
pub fn parse_links(html: &str, selector: &Selector, base: &Url) -> Result<Vec<Url>> {
    let doc = Html::parse_document(html);

    let links = doc
        .select(selector)
        .map(|e| {
            let href = e.value().attr("href").ok_or_else(|| Error::InvalidItemLink {
                link: e.html(),
                reason: "no href".to_string(),
            })?;
            base.join(href).map_err(|err| Error::InvalidItemLink {
                link: href.to_string(),
                reason: err.to_string(),
            })
        })
        .collect::<Result<Vec<Url>>>()?;

    ::log::debug!("HTML parser found {} matching links", links.len());
    Ok(links)
}

/// Whether any element matches `selector`
pub fn contains(html: &str, selector: &Selector) -> bool {
    let doc = Html::parse_document(html);
    doc.select(selector).next().is_some()
}

/// Text of the document `<title>`, whitespace collapsed like `document.title`
pub fn parse_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    let title_selector = Selector::parse("title").ok()?;
    let title = doc.select(&title_selector).next()?;
    Some(
        title
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    )
}
