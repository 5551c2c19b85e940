use std::time::Duration;

use agent_logging::agent_debug;
use tokio::time::{sleep, Instant};

use crate::document::DocumentSource;
use crate::sanitize::{sanitize_html, SanitizeSettings};
use crate::types::CaptureError;

/// Root selectors that signal a single-page application shell.
pub const SPA_ROOT_SELECTORS: &[&str] = &["#root", "#app", "#__next", "[data-reactroot]"];

/// Ordered "main content" selectors checked during key-element detection.
pub const KEY_CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    "#content",
    "#main",
    ".content",
];

/// Inner text below this length does not count as real content.
const KEY_CONTENT_MIN_CHARS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    FrameworkDetection,
    KeyElement,
    Stabilization,
    Snapshot,
}

pub trait CaptureProgressSink: Send + Sync {
    fn stage_started(&self, stage: CaptureStage);
}

pub struct NullProgressSink;

impl CaptureProgressSink for NullProgressSink {
    fn stage_started(&self, _stage: CaptureStage) {}
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub framework_timeout: Duration,
    pub key_element_timeout: Duration,
    pub stabilize_timeout: Duration,
    pub poll_interval: Duration,
    pub sample_interval: Duration,
    pub settle_delay: Duration,
    /// Consecutive equal size samples required before the document counts as
    /// stable.
    pub stable_samples: usize,
    pub sanitize: SanitizeSettings,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            framework_timeout: Duration::from_secs(5),
            key_element_timeout: Duration::from_secs(3),
            stabilize_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(250),
            sample_interval: Duration::from_millis(100),
            settle_delay: Duration::from_millis(500),
            stable_samples: 3,
            sanitize: SanitizeSettings::default(),
        }
    }
}

/// Four-stage bounded-time capture: framework detection, key-element
/// detection, content stabilization, snapshot + sanitize. Every stage is
/// best-effort with a hard timeout; only the final serialization can fail.
pub struct RenderCapture {
    settings: CaptureSettings,
}

impl RenderCapture {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }

    pub async fn capture(
        &self,
        doc: &dyn DocumentSource,
        sink: &dyn CaptureProgressSink,
    ) -> Result<String, CaptureError> {
        sink.stage_started(CaptureStage::FrameworkDetection);
        let framework = self.await_framework(doc).await;
        agent_debug!("framework detection finished, detected={framework}");

        sink.stage_started(CaptureStage::KeyElement);
        let key_element = self.await_key_element(doc).await;
        agent_debug!("key-element detection finished, matched={key_element:?}");

        sink.stage_started(CaptureStage::Stabilization);
        if self.await_stable(doc).await {
            sleep(self.settings.settle_delay).await;
        }

        sink.stage_started(CaptureStage::Snapshot);
        let html = doc.serialize().await?;
        Ok(sanitize_html(&html, &self.settings.sanitize))
    }

    /// Polls for SPA markers until detected or the stage budget runs out.
    /// Source errors count as "not detected yet".
    async fn await_framework(&self, doc: &dyn DocumentSource) -> bool {
        let deadline = Instant::now() + self.settings.framework_timeout;
        loop {
            if matches!(doc.has_framework_marker().await, Ok(true)) {
                return true;
            }
            for selector in SPA_ROOT_SELECTORS {
                if matches!(doc.element_child_count(selector).await, Ok(count) if count > 0) {
                    return true;
                }
            }
            if Instant::now() + self.settings.poll_interval > deadline {
                return false;
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Polls the ordered content selectors until one has non-trivial inner
    /// text, or times out.
    async fn await_key_element(&self, doc: &dyn DocumentSource) -> Option<&'static str> {
        let deadline = Instant::now() + self.settings.key_element_timeout;
        loop {
            for selector in KEY_CONTENT_SELECTORS.iter().copied() {
                if let Ok(text) = doc.inner_text(selector).await {
                    if text.trim().len() >= KEY_CONTENT_MIN_CHARS {
                        return Some(selector);
                    }
                }
            }
            if Instant::now() + self.settings.poll_interval > deadline {
                return None;
            }
            sleep(self.settings.poll_interval).await;
        }
    }

    /// Samples the serialized document size until it holds still for the
    /// configured number of consecutive samples. True when stability was
    /// observed within the budget.
    async fn await_stable(&self, doc: &dyn DocumentSource) -> bool {
        let deadline = Instant::now() + self.settings.stabilize_timeout;
        let mut last_len: Option<usize> = None;
        let mut streak = 0usize;
        loop {
            match doc.serialize().await {
                Ok(html) => {
                    let len = html.len();
                    if last_len == Some(len) {
                        streak += 1;
                        if streak + 1 >= self.settings.stable_samples {
                            return true;
                        }
                    } else {
                        streak = 0;
                    }
                    last_len = Some(len);
                }
                Err(_) => {
                    streak = 0;
                    last_len = None;
                }
            }
            if Instant::now() + self.settings.sample_interval > deadline {
                return false;
            }
            sleep(self.settings.sample_interval).await;
        }
    }
}
