use std::sync::Once;

use capture_core::{ModeChange, ModeFlag, SessionState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(agent_logging::initialize_for_tests);
}

#[test]
fn crawl_forces_analysis_off() {
    init_logging();
    let mut session = SessionState::new();
    session.set_mode(ModeFlag::Analysis, true);
    assert!(session.analysis_mode);

    let changes = session.set_mode(ModeFlag::Crawl, true);

    assert!(session.crawling_mode);
    assert!(!session.analysis_mode);
    assert_eq!(
        changes,
        vec![
            ModeChange {
                flag: ModeFlag::Analysis,
                enabled: false,
            },
            ModeChange {
                flag: ModeFlag::Crawl,
                enabled: true,
            },
        ]
    );
}

#[test]
fn analysis_forces_crawl_off() {
    init_logging();
    let mut session = SessionState::new();
    session.set_mode(ModeFlag::Crawl, true);

    session.set_mode(ModeFlag::Analysis, true);

    assert!(session.analysis_mode);
    assert!(!session.crawling_mode);
}

#[test]
fn both_processing_modes_can_be_off() {
    init_logging();
    let mut session = SessionState::new();
    session.set_mode(ModeFlag::Crawl, true);
    session.set_mode(ModeFlag::Crawl, false);

    assert!(!session.crawling_mode);
    assert!(!session.analysis_mode);
}

#[test]
fn resetting_current_value_emits_no_change() {
    init_logging();
    let mut session = SessionState::new();
    let first = session.set_mode(ModeFlag::Tracking, true);
    assert_eq!(first.len(), 1);

    let second = session.set_mode(ModeFlag::Tracking, true);
    assert!(second.is_empty());
    assert!(session.tracking_enabled);
}

#[test]
fn disabling_crawl_leaves_analysis_untouched() {
    init_logging();
    let mut session = SessionState::new();
    session.set_mode(ModeFlag::Crawl, true);

    let changes = session.set_mode(ModeFlag::Crawl, false);

    assert_eq!(
        changes,
        vec![ModeChange {
            flag: ModeFlag::Crawl,
            enabled: false,
        }]
    );
    assert!(!session.analysis_mode);
}

#[test]
fn force_html_is_independent_of_processing_modes() {
    init_logging();
    let mut session = SessionState::new();
    session.set_mode(ModeFlag::ForceHtml, true);
    session.set_mode(ModeFlag::Crawl, true);

    assert!(session.force_html_storage);
    assert!(session.crawling_mode);
}

#[test]
fn prompt_is_stored_verbatim() {
    init_logging();
    let mut session = SessionState::new();
    session.set_prompt("  extract name and price\n");
    assert_eq!(session.prompt, "  extract name and price\n");
}
