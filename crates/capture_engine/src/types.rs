use capture_core::RecordKind;
use thiserror::Error;

use crate::persist::PersistError;

/// Outcome of one admission attempt. Soft conditions are values here, not
/// errors; only storage faults surface as `Err` from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new pending record was created.
    Admitted(RecordKind),
    /// A record for this URL already exists in one of the tiers.
    AlreadyPresent,
    /// Tracking is off; nothing was admitted.
    TrackingDisabled,
    /// The caller must run a render-capture round trip and retry with HTML,
    /// either because the page appears to require authentication or because
    /// forced-HTML mode is on.
    SnapshotRequired,
}

impl Admission {
    pub fn admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_) | Admission::AlreadyPresent)
    }

    pub fn snapshot_required(&self) -> bool {
        matches!(self, Admission::SnapshotRequired)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("corrupt tier file {path}: {message}")]
    Corrupt { path: String, message: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no validated records to submit")]
    NothingToSubmit,
    #[error("extraction service returned status {status}")]
    Server { status: u16 },
    #[error("network failure: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("document source unavailable: {0}")]
    Source(String),
}
