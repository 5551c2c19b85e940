use std::time::Duration;

use agent_logging::{agent_info, agent_warn};
use capture_core::{CapturedRecord, RecordKind, SessionState, SubmitMode};
use serde::Serialize;

use crate::types::SubmitError;

/// Sample submissions carry a literal prefix of this many records, in stored
/// order. A preview of extraction quality, not a random sample.
pub const SAMPLE_LIMIT: usize = 3;

/// Validated records partitioned by kind, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionBatch {
    pub urls: Vec<String>,
    pub htmls: Vec<String>,
}

impl SubmissionBatch {
    pub fn len(&self) -> usize {
        self.urls.len() + self.htmls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.htmls.is_empty()
    }
}

/// Builds the outgoing batch from validated records in stored order.
/// `Sample` keeps the first [`SAMPLE_LIMIT`] records before partitioning.
pub fn build_batch(
    records: &[CapturedRecord],
    mode: SubmitMode,
) -> Result<SubmissionBatch, SubmitError> {
    let limited = match mode {
        SubmitMode::Full => records,
        SubmitMode::Sample => &records[..records.len().min(SAMPLE_LIMIT)],
    };
    if limited.is_empty() {
        return Err(SubmitError::NothingToSubmit);
    }

    let mut batch = SubmissionBatch {
        urls: Vec::new(),
        htmls: Vec::new(),
    };
    for record in limited {
        match record.kind {
            RecordKind::UrlOnly => batch.urls.push(record.url.clone()),
            RecordKind::HtmlSnapshot => {
                batch.htmls.push(record.payload.clone().unwrap_or_default())
            }
        }
    }
    Ok(batch)
}

#[derive(Serialize)]
struct UrlEntry<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct HtmlEntry<'a> {
    html: &'a str,
}

#[derive(Serialize)]
struct ProcessBody<'a> {
    urls: Vec<UrlEntry<'a>>,
    htmls: Vec<HtmlEntry<'a>>,
    prompt: &'a str,
    crawl: bool,
    analysis_only: bool,
}

#[derive(Debug, Clone)]
pub struct SubmitSettings {
    /// Base URL of the extraction service, without the `/api/process` path.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Extraction runs are slow; the service answers only when the CSV is
    /// ready.
    pub request_timeout: Duration,
}

impl SubmitSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(500),
        }
    }
}

/// HTTP client for the extraction backend. One request per submission; the
/// response body is CSV text returned verbatim, never parsed here.
pub struct ExtractionClient {
    settings: SubmitSettings,
    client: reqwest::Client,
}

impl ExtractionClient {
    pub fn new(settings: SubmitSettings) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SubmitError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub async fn process(
        &self,
        batch: &SubmissionBatch,
        session: &SessionState,
    ) -> Result<String, SubmitError> {
        let body = ProcessBody {
            urls: batch.urls.iter().map(|url| UrlEntry { url }).collect(),
            htmls: batch.htmls.iter().map(|html| HtmlEntry { html }).collect(),
            prompt: &session.prompt,
            crawl: session.crawling_mode,
            analysis_only: session.analysis_mode,
        };
        let endpoint = format!("{}/api/process", self.settings.base_url.trim_end_matches('/'));
        agent_info!(
            "submitting {} urls + {} htmls to {endpoint}",
            batch.urls.len(),
            batch.htmls.len()
        );

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                agent_warn!("submission transport failure: {err}");
                SubmitError::Network(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            agent_warn!("extraction service rejected submission: {status}");
            return Err(SubmitError::Server {
                status: status.as_u16(),
            });
        }
        response
            .text()
            .await
            .map_err(|err| SubmitError::Network(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use capture_core::{CapturedRecord, ReviewVerdict, SubmitMode};

    use super::{build_batch, SubmitError, SAMPLE_LIMIT};

    fn validated_url(url: &str, seq: u64) -> CapturedRecord {
        let mut record = CapturedRecord::url_only(url, seq, "t");
        record.apply_review(ReviewVerdict::Validated);
        record
    }

    fn validated_html(url: &str, html: &str, seq: u64) -> CapturedRecord {
        let mut record = CapturedRecord::html_snapshot(url, html, seq, "t");
        record.apply_review(ReviewVerdict::Validated);
        record
    }

    #[test]
    fn full_mode_partitions_by_kind() {
        let records = vec![
            validated_url("https://a.example.com", 1),
            validated_html("https://b.example.com", "<main>b</main>", 2),
            validated_url("https://c.example.com", 3),
        ];
        let batch = build_batch(&records, SubmitMode::Full).unwrap();
        assert_eq!(
            batch.urls,
            vec!["https://a.example.com", "https://c.example.com"]
        );
        assert_eq!(batch.htmls, vec!["<main>b</main>"]);
    }

    #[test]
    fn sample_mode_takes_a_literal_prefix() {
        let records: Vec<_> = (1..=5)
            .map(|i| validated_url(&format!("https://{i}.example.com"), i))
            .collect();
        let batch = build_batch(&records, SubmitMode::Sample).unwrap();
        assert_eq!(batch.len(), SAMPLE_LIMIT);
        assert_eq!(
            batch.urls,
            vec![
                "https://1.example.com",
                "https://2.example.com",
                "https://3.example.com"
            ]
        );
    }

    #[test]
    fn sample_mode_with_fewer_records_sends_them_all() {
        let records = vec![
            validated_url("https://a.example.com", 1),
            validated_html("https://b.example.com", "<p>b</p>", 2),
        ];
        let batch = build_batch(&records, SubmitMode::Sample).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn empty_set_is_nothing_to_submit() {
        let err = build_batch(&[], SubmitMode::Full).unwrap_err();
        assert!(matches!(err, SubmitError::NothingToSubmit));
    }
}
