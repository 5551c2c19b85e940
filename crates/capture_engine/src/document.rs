use std::time::Duration;

use agent_logging::agent_debug;
use scraper::{Html, Selector};

use crate::types::CaptureError;

/// A live view of the document rendered for one page in the host. The
/// orchestrator only ever reads through this interface, so readiness
/// heuristics can be swapped or stubbed without touching pipeline logic.
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    /// Serialized outer HTML of the current document.
    async fn serialize(&self) -> Result<String, CaptureError>;
    /// Child element count under the first match of `selector`.
    async fn element_child_count(&self, selector: &str) -> Result<usize, CaptureError>;
    /// Inner text of the first match of `selector`; empty when absent.
    async fn inner_text(&self, selector: &str) -> Result<String, CaptureError>;
    /// Whether a known global framework marker is present.
    async fn has_framework_marker(&self) -> Result<bool, CaptureError>;
}

/// Opens a document view for a URL currently rendered in the host.
#[async_trait::async_trait]
pub trait DocumentProvider: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn DocumentSource>, CaptureError>;
}

/// Markers left in served markup by the common SPA frameworks.
const FRAMEWORK_MARKERS: &[&str] = &["data-reactroot", "__NEXT_DATA__", "ng-version", "data-v-app"];

/// A fixed document: selector queries run against one parsed snapshot. The
/// content never changes, so stabilization converges immediately.
pub struct StaticHtmlDocument {
    html: String,
}

impl StaticHtmlDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

fn first_match_child_count(html: &str, selector: &str) -> usize {
    let Ok(parsed) = Selector::parse(selector) else {
        return 0;
    };
    let doc = Html::parse_document(html);
    doc.select(&parsed)
        .next()
        .map(|element| element.child_elements().count())
        .unwrap_or(0)
}

fn first_match_inner_text(html: &str, selector: &str) -> String {
    let Ok(parsed) = Selector::parse(selector) else {
        return String::new();
    };
    let doc = Html::parse_document(html);
    doc.select(&parsed)
        .next()
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl DocumentSource for StaticHtmlDocument {
    async fn serialize(&self) -> Result<String, CaptureError> {
        Ok(self.html.clone())
    }

    async fn element_child_count(&self, selector: &str) -> Result<usize, CaptureError> {
        Ok(first_match_child_count(&self.html, selector))
    }

    async fn inner_text(&self, selector: &str) -> Result<String, CaptureError> {
        Ok(first_match_inner_text(&self.html, selector))
    }

    async fn has_framework_marker(&self) -> Result<bool, CaptureError> {
        Ok(FRAMEWORK_MARKERS
            .iter()
            .any(|marker| self.html.contains(marker)))
    }
}

#[derive(Debug, Clone)]
pub struct PageFetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for PageFetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Headless fallback provider: fetches the page once over HTTP and serves it
/// as a static document. No scripts run, so this sees only served markup;
/// an embedding host with a real DOM should supply its own provider.
pub struct FetchedPageProvider {
    client: reqwest::Client,
}

impl FetchedPageProvider {
    pub fn new(settings: PageFetchSettings) -> Result<Self, CaptureError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| CaptureError::Source(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl DocumentProvider for FetchedPageProvider {
    async fn open(&self, url: &str) -> Result<Box<dyn DocumentSource>, CaptureError> {
        let parsed = url::Url::parse(url)
            .map_err(|err| CaptureError::Source(format!("invalid url {url}: {err}")))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|err| CaptureError::Source(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CaptureError::Source(format!(
                "page fetch for {url} answered {status}"
            )));
        }
        let html = response
            .text()
            .await
            .map_err(|err| CaptureError::Source(err.to_string()))?;
        agent_debug!("fetched {} bytes of markup for {url}", html.len());
        Ok(Box::new(StaticHtmlDocument::new(html)))
    }
}
