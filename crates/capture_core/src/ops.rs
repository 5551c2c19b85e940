use serde::{Deserialize, Serialize};

use crate::record::{CapturedRecord, ReviewVerdict};
use crate::session::ModeFlag;
use crate::usage::UsageReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    Full,
    Sample,
}

/// Inbound operations, one payload shape per variant. The dispatcher
/// pattern-matches exhaustively; adding a variant is a compile error at
/// every call site until handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// A navigation event; triggers admission.
    Navigation { url: String },
    /// Run the render-capture sequence for a page, then admit the snapshot.
    CaptureHtml { url: String },
    /// All captured records, both tiers merged, newest first.
    ListRecords,
    /// Apply a reviewer verdict to one record.
    SetValidation { url: String, status: ReviewVerdict },
    Remove { url: String },
    RemoveAll,
    /// Bulk-advance every pending record to validated.
    ValidateAllPending,
    Submit { mode: SubmitMode },
    GetUsage,
    SetMode { flag: ModeFlag, enabled: bool },
    SetPrompt { prompt: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    Admission {
        admitted: bool,
        requires_auth: bool,
    },
    Records {
        records: Vec<CapturedRecord>,
    },
    Done {
        success: bool,
    },
    Usage {
        report: UsageReport,
    },
    Submission {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        csv: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Ack,
}
