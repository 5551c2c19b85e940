//! Capture core: pure record, session, and operation types.
mod ops;
mod record;
mod session;
mod url_norm;
mod usage;

pub use ops::{Request, Response, SubmitMode};
pub use record::{CapturedRecord, RecordKind, ReviewVerdict, ValidationStatus};
pub use session::{ModeChange, ModeFlag, SessionState};
pub use url_norm::normalize_url_for_dedup;
pub use usage::{KeyUsage, TierUsage, UsageReport, QUOTA_WARN_PERCENT};
