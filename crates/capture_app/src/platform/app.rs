use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use agent_logging::{agent_error, agent_info, agent_warn};
use capture_core::{ModeChange, Request};
use capture_engine::{
    AgentBootstrap, AgentHandle, CaptureSettings, ExtractionClient, FetchedPageProvider,
    HttpAuthProbe, JsonFileTier, NotificationSink, PageFetchSettings, ProbeSettings,
    RenderCapture, ServiceParts, SubmitSettings, TierKind,
};
use chrono::Utc;

use super::logging::{self, LogDestination};
use super::persistence;

pub struct AgentOptions {
    pub state_dir: PathBuf,
    pub extraction_base_url: String,
}

impl AgentOptions {
    /// First CLI argument is the extraction backend base URL; the state
    /// directory comes from `CAPTURE_STATE_DIR`.
    pub fn from_env() -> Self {
        let extraction_base_url = std::env::args()
            .nth(1)
            .or_else(|| std::env::var("CAPTURE_BACKEND_URL").ok())
            .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
        let state_dir = std::env::var("CAPTURE_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./capture_state"));
        Self {
            state_dir,
            extraction_base_url,
        }
    }
}

/// Mode notifications in the headless host surface through the log; there
/// is no presentation context listening, and delivery is best-effort anyway.
struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn mode_changed(&self, change: ModeChange) {
        agent_info!("mode changed: {:?} -> {}", change.flag, change.enabled);
    }
}

/// Runs the agent as a line-delimited JSON request/response loop: one
/// request per stdin line, one response per stdout line. Logs stay on
/// stderr and `./agent.log` so the response stream remains clean.
pub fn run_agent(options: AgentOptions) -> anyhow::Result<()> {
    logging::initialize(LogDestination::Both);

    let session = persistence::load_session(&options.state_dir);
    let compact = JsonFileTier::open(&options.state_dir, TierKind::Compact)?;
    let bulk = JsonFileTier::open(&options.state_dir, TierKind::Bulk)?;

    let parts = ServiceParts {
        probe: Arc::new(HttpAuthProbe::new(ProbeSettings::default())?),
        documents: Arc::new(FetchedPageProvider::new(PageFetchSettings::default())?),
        extraction: ExtractionClient::new(SubmitSettings::new(
            options.extraction_base_url.clone(),
        ))?,
        capture: RenderCapture::new(CaptureSettings::default()),
        notifications: Arc::new(LogNotificationSink),
    };

    let state_dir = options.state_dir.clone();
    let handle = AgentHandle::new(
        AgentBootstrap {
            session,
            compact: Box::new(compact),
            bulk: Box::new(bulk),
            parts,
            now_utc: Arc::new(|| Utc::now().to_rfc3339()),
        },
        move |session| persistence::save_session(&state_dir, session),
    );

    agent_info!(
        "capture agent listening on stdin, extraction backend at {}",
        options.extraction_base_url
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                agent_warn!("unparseable request line: {err}");
                let error = serde_json::json!({"kind": "error", "message": err.to_string()});
                writeln!(stdout.lock(), "{error}")?;
                continue;
            }
        };
        match handle.request(request) {
            Some(response) => {
                writeln!(stdout.lock(), "{}", serde_json::to_string(&response)?)?;
            }
            None => {
                agent_error!("agent context terminated; shutting down");
                break;
            }
        }
    }
    Ok(())
}
