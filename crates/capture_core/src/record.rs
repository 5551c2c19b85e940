use serde::{Deserialize, Serialize};

/// How a page was captured. Fixed at admission, never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    UrlOnly,
    HtmlSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Validated,
    Invalid,
}

/// A reviewer's verdict. There is deliberately no `Pending` variant: a record
/// can never be sent back to the pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVerdict {
    Validated,
    Invalid,
}

impl From<ReviewVerdict> for ValidationStatus {
    fn from(verdict: ReviewVerdict) -> Self {
        match verdict {
            ReviewVerdict::Validated => ValidationStatus::Validated,
            ReviewVerdict::Invalid => ValidationStatus::Invalid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedRecord {
    pub url: String,
    pub kind: RecordKind,
    /// Sanitized HTML text; present iff `kind == HtmlSnapshot`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub status: ValidationStatus,
    /// Admission sequence number. Defines stored order across both tiers.
    pub seq: u64,
    pub captured_utc: String,
}

impl CapturedRecord {
    pub fn url_only(url: impl Into<String>, seq: u64, captured_utc: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RecordKind::UrlOnly,
            payload: None,
            status: ValidationStatus::Pending,
            seq,
            captured_utc: captured_utc.into(),
        }
    }

    pub fn html_snapshot(
        url: impl Into<String>,
        payload: impl Into<String>,
        seq: u64,
        captured_utc: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            kind: RecordKind::HtmlSnapshot,
            payload: Some(payload.into()),
            status: ValidationStatus::Pending,
            seq,
            captured_utc: captured_utc.into(),
        }
    }

    /// Applies a reviewer verdict. Returns true when the status actually
    /// changed; re-applying the current verdict is a no-op.
    pub fn apply_review(&mut self, verdict: ReviewVerdict) -> bool {
        let next: ValidationStatus = verdict.into();
        if self.status == next {
            return false;
        }
        self.status = next;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.status == ValidationStatus::Pending
    }

    pub fn is_validated(&self) -> bool {
        self.status == ValidationStatus::Validated
    }
}
