use std::sync::mpsc;
use std::thread;

use agent_logging::{agent_error, agent_info};
use capture_core::{Request, Response, SessionState};

use crate::service::{AgentService, ServiceParts};
use crate::storage::TierStore;
use crate::store::{CaptureStore, UtcClock};

/// Everything the background context needs to assemble its service. Built by
/// the embedding host, consumed once on the agent thread.
pub struct AgentBootstrap {
    pub session: SessionState,
    pub compact: Box<dyn TierStore>,
    pub bulk: Box<dyn TierStore>,
    pub parts: ServiceParts,
    pub now_utc: UtcClock,
}

struct AgentCommand {
    request: Request,
    reply_tx: mpsc::Sender<Response>,
}

/// Handle to the one long-lived background context. Foreground contexts send
/// requests through the channel; the agent thread processes them to
/// completion one at a time, so check-then-write sequences over the record
/// set never interleave.
pub struct AgentHandle {
    cmd_tx: mpsc::Sender<AgentCommand>,
}

impl AgentHandle {
    /// Spawns the agent thread and its runtime. `session_saver` runs after
    /// each request that changed the session flags or prompt.
    pub fn new(
        bootstrap: AgentBootstrap,
        session_saver: impl Fn(&SessionState) + Send + 'static,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AgentCommand>();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let store = match runtime.block_on(CaptureStore::open(
                bootstrap.compact,
                bootstrap.bulk,
                bootstrap.now_utc,
            )) {
                Ok(store) => store,
                Err(err) => {
                    agent_error!("agent failed to open capture store: {err}");
                    return;
                }
            };
            let mut service = AgentService::new(bootstrap.session, store, bootstrap.parts);
            agent_info!("capture agent context running");

            while let Ok(command) = cmd_rx.recv() {
                let touches_session = matches!(
                    command.request,
                    Request::SetMode { .. } | Request::SetPrompt { .. }
                );
                let response = runtime.block_on(service.handle(command.request));
                if touches_session {
                    session_saver(service.session());
                }
                let _ = command.reply_tx.send(response);
            }
        });

        Self { cmd_tx }
    }

    /// Sends one request and waits for its response. `None` when the agent
    /// context has terminated.
    pub fn request(&self, request: Request) -> Option<Response> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx.send(AgentCommand { request, reply_tx }).ok()?;
        reply_rx.recv().ok()
    }
}
