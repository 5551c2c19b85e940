use std::sync::Once;

use capture_core::{CapturedRecord, RecordKind, ReviewVerdict, ValidationStatus};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(agent_logging::initialize_for_tests);
}

#[test]
fn records_start_pending() {
    init_logging();
    let record = CapturedRecord::url_only("https://a.example.com", 1, "2026-01-01T00:00:00Z");
    assert_eq!(record.status, ValidationStatus::Pending);
    assert_eq!(record.kind, RecordKind::UrlOnly);
    assert!(record.payload.is_none());
}

#[test]
fn snapshot_records_carry_payload() {
    init_logging();
    let record = CapturedRecord::html_snapshot(
        "https://b.example.com",
        "<main>hello</main>",
        2,
        "2026-01-01T00:00:00Z",
    );
    assert_eq!(record.kind, RecordKind::HtmlSnapshot);
    assert_eq!(record.payload.as_deref(), Some("<main>hello</main>"));
}

#[test]
fn pending_advances_to_either_verdict() {
    init_logging();
    let mut record = CapturedRecord::url_only("https://a.example.com", 1, "t");
    assert!(record.apply_review(ReviewVerdict::Validated));
    assert_eq!(record.status, ValidationStatus::Validated);

    let mut record = CapturedRecord::url_only("https://a.example.com", 1, "t");
    assert!(record.apply_review(ReviewVerdict::Invalid));
    assert_eq!(record.status, ValidationStatus::Invalid);
}

#[test]
fn reviewer_can_flip_an_earlier_verdict() {
    init_logging();
    let mut record = CapturedRecord::url_only("https://a.example.com", 1, "t");
    record.apply_review(ReviewVerdict::Validated);

    assert!(record.apply_review(ReviewVerdict::Invalid));
    assert_eq!(record.status, ValidationStatus::Invalid);
}

#[test]
fn reapplying_current_verdict_is_a_noop() {
    init_logging();
    let mut record = CapturedRecord::url_only("https://a.example.com", 1, "t");
    record.apply_review(ReviewVerdict::Validated);

    assert!(!record.apply_review(ReviewVerdict::Validated));
    assert_eq!(record.status, ValidationStatus::Validated);
}
