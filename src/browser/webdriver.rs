use crate::browser::{Browser, PdfCapture};
use crate::config::ArchiverConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use fantoccini::error::CmdError;
use fantoccini::wd::{WebDriverCompatibleCommand, WindowHandle};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::path::Path;
use url::Url;

/// Removes all matches of `arguments[0]` and returns how many there were
const REMOVE_ELEMENTS_SCRIPT: &str = r#"
    const matches = document.querySelectorAll(arguments[0]);
    matches.forEach((el) => el.remove());
    return matches.length;
"#;

/// Tags the current document with a random id on first call and returns it.
/// A navigation replaces `window`, so a new document reports a new id.
const DOCUMENT_ID_SCRIPT: &str = r#"
    if (!window.__ttgDocumentId) {
        window.__ttgDocumentId = Date.now().toString(36) + Math.random().toString(36).slice(2);
    }
    return window.__ttgDocumentId;
"#;

/// Error fragments WebDriver servers use when printing is not available
const PRINT_UNSUPPORTED_MARKERS: &[&str] = &[
    "unknown command",
    "unsupported operation",
    "not implemented",
    "printtopdf is not",
];

/// A Chrome DevTools command sent through ChromeDriver's CDP bridge
#[derive(Debug)]
struct CdpCommand {
    cmd: &'static str,
    params: Value,
}

impl WebDriverCompatibleCommand for CdpCommand {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> std::result::Result<url::Url, url::ParseError> {
        base_url.join(&format!(
            "session/{}/goog/cdp/execute",
            session_id.unwrap_or_default()
        ))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        let body = json!({ "cmd": self.cmd, "params": self.params });
        (http::Method::POST, Some(body.to_string()))
    }
}

/// W3C "Print Page": renders the current document to a base64 PDF
#[derive(Debug)]
struct PrintCommand {
    options: Value,
}

impl WebDriverCompatibleCommand for PrintCommand {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> std::result::Result<url::Url, url::ParseError> {
        base_url.join(&format!("session/{}/print", session_id.unwrap_or_default()))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        (http::Method::POST, Some(self.options.to_string()))
    }
}

/// Decodes the PDF from a print response, with or without the `value` envelope
fn decode_pdf(response: &Value) -> Result<Vec<u8>> {
    let encoded = response
        .as_str()
        .or_else(|| response.get("value").and_then(Value::as_str))
        .ok_or_else(|| Error::InvalidResponse(format!("print returned {}", response)))?;
    BASE64
        .decode(encoded)
        .map_err(|e| Error::InvalidResponse(format!("print returned invalid base64: {}", e)))
}

/// A tab opened on the WebDriver session
#[derive(Debug, Clone)]
pub struct WebDriverTab {
    handle: WindowHandle,
    parent: WindowHandle,
}

/// [`Browser`] backed by one WebDriver session
#[derive(Clone)]
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Connects to the configured WebDriver server, falling back to common local ports
    pub async fn connect(config: &ArchiverConfig) -> Result<Self> {
        let capabilities = session_capabilities(config.headless);

        let fallback_urls = [
            "http://localhost:9515", // ChromeDriver default
            "http://127.0.0.1:4444", // Try with IP instead of localhost
        ];
        let candidates = std::iter::once(config.webdriver_url.as_str())
            .chain(fallback_urls.into_iter().filter(|url| *url != config.webdriver_url));

        let mut tried = Vec::new();
        for url in candidates {
            let mut builder = ClientBuilder::native();
            builder.capabilities(capabilities.clone());
            match builder.connect(url).await {
                Ok(client) => {
                    ::log::info!("Connected to WebDriver at {}", url);
                    return Ok(Self { client });
                }
                Err(e) => {
                    if tried.is_empty() {
                        ::log::error!("Failed to connect to WebDriver at {}: {}", url, e);
                    } else {
                        // Don't log error for fallbacks to avoid log spam
                        ::log::debug!("Fallback WebDriver {} refused: {}", url, e);
                    }
                    tried.push(url.to_string());
                }
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(Error::WebDriverUnavailable(tried.join(", ")))
    }

    async fn cdp(&self, cmd: &'static str, params: Value) -> Result<Value> {
        ::log::trace!("CDP {} {}", cmd, params);
        Ok(self.client.issue_cmd(CdpCommand { cmd, params }).await?)
    }
}

/// Chrome session capabilities; `eager` returns from navigation at DOMContentLoaded
fn session_capabilities(headless: bool) -> serde_json::Map<String, Value> {
    let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
    if headless {
        args.push("--headless=new");
    }

    let mut capabilities = serde_json::Map::new();
    capabilities.insert("browserName".to_string(), json!("chrome"));
    capabilities.insert("pageLoadStrategy".to_string(), json!("eager"));
    capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    capabilities
}

fn element_error(error: CmdError, selector: &str) -> Error {
    if error.is_no_such_element() {
        Error::ElementNotFound(selector.to_string())
    } else {
        Error::WebDriver(error)
    }
}

fn is_print_unsupported(error: &CmdError) -> bool {
    let message = error.to_string().to_lowercase();
    PRINT_UNSUPPORTED_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Tab = WebDriverTab;

    async fn goto(&self, url: &Url) -> Result<()> {
        ::log::debug!("GOTO: {}", url);
        self.client.goto(url.as_str()).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<Url> {
        Ok(self.client.current_url().await?)
    }

    async fn document_id(&self) -> Result<String> {
        let id = self.client.execute(DOCUMENT_ID_SCRIPT, Vec::new()).await?;
        id.as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidResponse(format!("document id script returned {}", id)))
    }

    async fn source(&self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| element_error(e, selector))?;
        element.send_keys(text).await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(|e| element_error(e, selector))?;
        element.click().await?;
        Ok(())
    }

    async fn remove_elements(&self, selector: &str) -> Result<usize> {
        let removed = self
            .client
            .execute(REMOVE_ELEMENTS_SCRIPT, vec![json!(selector)])
            .await?;
        Ok(removed.as_u64().unwrap_or(0) as usize)
    }

    async fn print_pdf(&self) -> Result<PdfCapture> {
        let print = PrintCommand {
            options: json!({ "background": true }),
        };
        match self.client.issue_cmd(print).await {
            Ok(response) => Ok(PdfCapture::Rendered(decode_pdf(&response)?)),
            Err(e) if is_print_unsupported(&e) => {
                ::log::debug!("Printing unavailable: {}", e);
                Ok(PdfCapture::Unsupported)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_download_dir(&self, dir: &Path) -> Result<()> {
        self.cdp(
            "Page.setDownloadBehavior",
            json!({ "behavior": "allow", "downloadPath": dir.to_string_lossy() }),
        )
        .await?;
        Ok(())
    }

    async fn open_tab(&self) -> Result<WebDriverTab> {
        let parent = self.client.window().await?;
        let opened = self.client.new_window(true).await?;
        self.client.switch_to_window(opened.handle.clone()).await?;
        ::log::trace!("Opened tab {:?}", opened.handle);
        Ok(WebDriverTab {
            handle: opened.handle,
            parent,
        })
    }

    async fn close_tab(&self, tab: WebDriverTab) -> Result<()> {
        self.client.switch_to_window(tab.handle.clone()).await?;
        self.client.close_window().await?;
        self.client.switch_to_window(tab.parent).await?;
        ::log::trace!("Closed tab {:?}", tab.handle);
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        self.client.clone().close().await?;
        ::log::debug!("WebDriver session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let headless = session_capabilities(true);
        assert_eq!(headless["pageLoadStrategy"], json!("eager"));
        let args = headless["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.contains(&json!("--headless=new")));

        let headful = session_capabilities(false);
        let args = headful["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.contains(&json!("--headless=new")));
        assert!(args.contains(&json!("--no-sandbox")));
    }

    #[test]
    fn test_cdp_command_request() {
        let cmd = CdpCommand {
            cmd: "Page.setDownloadBehavior",
            params: json!({ "behavior": "allow", "downloadPath": "/tmp/x" }),
        };
        let base = Url::parse("http://localhost:4444/").unwrap();
        let endpoint = cmd.endpoint(&base, Some("abc")).unwrap();
        assert_eq!(
            endpoint.as_str(),
            "http://localhost:4444/session/abc/goog/cdp/execute"
        );

        let (method, body) = cmd.method_and_body(&endpoint);
        assert_eq!(method, http::Method::POST);
        let body: Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(body["cmd"], json!("Page.setDownloadBehavior"));
        assert_eq!(body["params"]["downloadPath"], json!("/tmp/x"));
    }

    #[test]
    fn test_print_command_request() {
        let cmd = PrintCommand {
            options: json!({ "background": true }),
        };
        let base = Url::parse("http://localhost:9515/").unwrap();
        let endpoint = cmd.endpoint(&base, Some("abc")).unwrap();
        assert_eq!(endpoint.as_str(), "http://localhost:9515/session/abc/print");

        let (method, body) = cmd.method_and_body(&endpoint);
        assert_eq!(method, http::Method::POST);
        assert_eq!(body.as_deref(), Some(r#"{"background":true}"#));
    }

    #[test]
    fn test_decode_pdf_response() {
        // "%PDF-1.4" in base64
        assert_eq!(decode_pdf(&json!("JVBERi0xLjQ=")).unwrap(), b"%PDF-1.4");
        assert_eq!(
            decode_pdf(&json!({ "value": "JVBERi0xLjQ=" })).unwrap(),
            b"%PDF-1.4"
        );
        assert!(matches!(
            decode_pdf(&json!({ "value": 3 })),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(
            decode_pdf(&json!("not base64!")),
            Err(Error::InvalidResponse(_))
        ));
    }
}
