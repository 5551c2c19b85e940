//! Capture engine: storage tiers, admission, probes, render capture, and
//! batch submission.
mod agent;
mod document;
mod persist;
mod probe;
mod readiness;
mod sanitize;
mod service;
mod storage;
mod store;
mod submit;
mod types;

pub use agent::{AgentBootstrap, AgentHandle};
pub use document::{
    DocumentProvider, DocumentSource, FetchedPageProvider, PageFetchSettings, StaticHtmlDocument,
};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use probe::{classify_response, HttpAuthProbe, ProbeError, ProbeSettings, ProbesAuthentication};
pub use readiness::{
    CaptureProgressSink, CaptureSettings, CaptureStage, NullProgressSink, RenderCapture,
    KEY_CONTENT_SELECTORS, SPA_ROOT_SELECTORS,
};
pub use sanitize::{sanitize_html, SanitizeSettings, TRUNCATION_MARKER};
pub use service::{AgentService, NotificationSink, NullNotificationSink, ServiceParts};
pub use storage::{
    record_size, tier_usage, JsonFileTier, MemoryTier, TierKind, TierStore, BULK_QUOTA_BYTES,
    COMPACT_QUOTA_BYTES,
};
pub use store::{CaptureStore, UtcClock};
pub use submit::{build_batch, ExtractionClient, SubmissionBatch, SubmitSettings, SAMPLE_LIMIT};
pub use types::{Admission, CaptureError, StorageError, SubmitError};
