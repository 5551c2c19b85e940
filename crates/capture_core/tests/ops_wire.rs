use std::sync::Once;

use capture_core::{ModeFlag, Request, Response, SubmitMode};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(agent_logging::initialize_for_tests);
}

#[test]
fn requests_round_trip_through_json() {
    init_logging();
    let requests = vec![
        Request::Navigation {
            url: "https://a.example.com".to_string(),
        },
        Request::SetMode {
            flag: ModeFlag::ForceHtml,
            enabled: true,
        },
        Request::Submit {
            mode: SubmitMode::Sample,
        },
        Request::RemoveAll,
    ];
    for request in requests {
        let line = serde_json::to_string(&request).expect("serialize");
        let back: Request = serde_json::from_str(&line).expect("deserialize");
        assert_eq!(back, request);
    }
}

#[test]
fn request_tag_names_are_stable() {
    init_logging();
    let line = serde_json::to_string(&Request::ValidateAllPending).expect("serialize");
    assert_eq!(line, r#"{"op":"validate_all_pending"}"#);

    let parsed: Request =
        serde_json::from_str(r#"{"op":"set_validation","url":"https://a.example.com","status":"invalid"}"#)
            .expect("deserialize");
    match parsed {
        Request::SetValidation { url, .. } => assert_eq!(url, "https://a.example.com"),
        other => panic!("unexpected request: {other:?}"),
    }
}

#[test]
fn admission_response_carries_both_flags() {
    init_logging();
    let response = Response::Admission {
        admitted: false,
        requires_auth: true,
    };
    let line = serde_json::to_string(&response).expect("serialize");
    assert_eq!(
        line,
        r#"{"kind":"admission","admitted":false,"requires_auth":true}"#
    );
}
