
use crate::config::ArchiverConfig;
use fake_browser::FakeSiteBuilder;

const BASE: &str = "https://ttg.test";

pub(crate) fn test_config() -> ArchiverConfig {
    ArchiverConfig {
        base_url: BASE.to_string(),
        ..ArchiverConfig::default()
    }
}

pub(crate) fn login_page(navigates: bool) -> String {
    let action = if navigates {
        r#" formaction="/Home.html""#
    } else {
        ""
    };
    format!(
        r#"<html><head><title>Account - The Tech Game</title></head><body>
        <form><input id="username"><input id="password" type="password">
        <div id="buttons"><button type="submit"{action}>Log in</button></div></form>
        </body></html>"#
    )
}

pub(crate) fn home_page() -> &'static str {
    "<html><head><title>Home - The Tech Game</title></head><body>Welcome</body></html>"
}

/// A site with a working login and nothing else
pub(crate) fn site() -> FakeSiteBuilder {
    FakeSiteBuilder::new(BASE)
        .page("/Account.html", login_page(true))
        .page("/Home.html", home_page())
}

pub(crate) fn listing_page(items: &[(&str, &str)], next: Option<&str>) -> String {
    let rows: String = items
        .iter()
        .map(|(href, name)| {
            format!(
                r#"<tr><td><a class="forumlink" title="Download" href="{href}">{name}</a></td>
                <td><a class="forumlink" title="Comments" href="{href}#comments">0</a></td></tr>"#
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a title="Next page" href="{href}">Next</a>"#))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>Downloads - The Tech Game</title></head><body>
        <table>{rows}</table>{next}</body></html>"#
    )
}

pub(crate) fn item_page(name: &str, file: &str) -> String {
    format!(
        r#"<html><head><title>{name} - The Tech Game</title></head><body>
        <div id="nav"><a title="Manage your profile" href="/Profile.html">alice</a></div>
        <h1>{name}</h1>
        <div id="buttons"><button title="Download" data-download="{file}">Download</button></div>
        </body></html>"#
    )
}
