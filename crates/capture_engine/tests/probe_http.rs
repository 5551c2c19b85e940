use std::sync::Once;
use std::time::Duration;

use capture_engine::{HttpAuthProbe, ProbeSettings, ProbesAuthentication};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(agent_logging::initialize_for_tests);
}

fn probe() -> HttpAuthProbe {
    HttpAuthProbe::new(ProbeSettings::default()).expect("build probe")
}

#[tokio::test]
async fn reachable_page_is_open() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    assert!(!probe().requires_auth(&format!("{}/page", server.uri())).await);
}

#[tokio::test]
async fn unauthorized_and_forbidden_are_gated() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let probe = probe();
    assert!(probe.requires_auth(&format!("{}/private", server.uri())).await);
    assert!(
        probe
            .requires_auth(&format!("{}/forbidden", server.uri()))
            .await
    );
}

#[tokio::test]
async fn redirect_to_login_is_gated_and_not_followed() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/accounts/Login?next=%2F"),
        )
        .mount(&server)
        .await;
    // The login target must never be requested; redirects stay unfollowed.
    Mock::given(method("GET"))
        .and(path("/accounts/Login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(probe().requires_auth(&format!("{}/account", server.uri())).await);
}

#[tokio::test]
async fn benign_redirect_is_open() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new-home"))
        .mount(&server)
        .await;

    assert!(!probe().requires_auth(&format!("{}/moved", server.uri())).await);
}

#[tokio::test]
async fn challenge_header_is_gated_even_on_success() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/basic"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("WWW-Authenticate", "Basic realm=\"x\""),
        )
        .mount(&server)
        .await;

    assert!(probe().requires_auth(&format!("{}/basic", server.uri())).await);
}

#[tokio::test]
async fn unexpected_errors_fail_closed() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let probe = probe();
    assert!(probe.requires_auth(&format!("{}/missing", server.uri())).await);
    assert!(probe.requires_auth(&format!("{}/broken", server.uri())).await);
}

#[tokio::test]
async fn network_failure_fails_open() {
    init_logging();
    let settings = ProbeSettings {
        connect_timeout: Duration::from_millis(200),
        request_timeout: Duration::from_millis(400),
        ..ProbeSettings::default()
    };
    let probe = HttpAuthProbe::new(settings).expect("build probe");

    // Nothing listens here; the request gets no response at all.
    assert!(!probe.requires_auth("http://127.0.0.1:9/unreachable").await);
}

#[tokio::test]
async fn probe_sends_cache_defeating_headers() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .and(header("Cache-Control", "no-cache"))
        .and(header("Pragma", "no-cache"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // Without the headers the mock does not match, the server answers 404,
    // and the classification flips to gated.
    assert!(!probe().requires_auth(&format!("{}/cached", server.uri())).await);
}
