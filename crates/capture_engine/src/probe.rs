use std::time::Duration;

use agent_logging::{agent_debug, agent_warn};
use reqwest::header::{HeaderMap, HeaderValue, LOCATION, WWW_AUTHENTICATE};
use reqwest::redirect;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe client error: {0}")]
    Client(String),
}

/// Decides whether a URL is reachable without credentials. A heuristic;
/// false positives and negatives are expected and acceptable.
#[async_trait::async_trait]
pub trait ProbesAuthentication: Send + Sync {
    async fn requires_auth(&self, url: &str) -> bool;
}

/// Classification of a completed response. Fail-closed: origins that answer
/// access-restricted resources with ordinary error codes still count as
/// auth-gated.
pub fn classify_response(status: u16, location: Option<&str>, www_authenticate: bool) -> bool {
    if www_authenticate {
        return true;
    }
    match status {
        401 | 403 => true,
        300..=399 => location
            .map(|value| {
                let lowered = value.to_ascii_lowercase();
                ["login", "auth", "signin"]
                    .iter()
                    .any(|marker| lowered.contains(marker))
            })
            .unwrap_or(false),
        200..=299 => false,
        _ => true,
    }
}

/// Probe over a bare GET: credentials omitted, caching disabled, redirects
/// not followed, generic headers only.
pub struct HttpAuthProbe {
    client: reqwest::Client,
}

impl HttpAuthProbe {
    pub fn new(settings: ProbeSettings) -> Result<Self, ProbeError> {
        let mut headers = HeaderMap::new();
        headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
        headers.insert("Pragma", HeaderValue::from_static("no-cache"));
        headers.insert(
            "Accept",
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent)
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|err| ProbeError::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ProbesAuthentication for HttpAuthProbe {
    async fn requires_auth(&self, url: &str) -> bool {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                // Fail-open on transport failure: a transient network problem
                // must not block capture permanently.
                agent_warn!("auth probe got no response from {url}: {err}");
                return false;
            }
        };

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());
        let www_authenticate = response.headers().contains_key(WWW_AUTHENTICATE);
        let verdict = classify_response(status, location, www_authenticate);
        agent_debug!("auth probe {url}: status={status} requires_auth={verdict}");
        verdict
    }
}
