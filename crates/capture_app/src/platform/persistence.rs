use std::fs;
use std::path::{Path, PathBuf};

use agent_logging::{agent_error, agent_info, agent_warn};
use capture_core::SessionState;
use capture_engine::{ensure_state_dir, AtomicFileWriter};
use serde::{Deserialize, Serialize};

const SESSION_FILENAME: &str = ".capture_session.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSession {
    tracking_enabled: bool,
    crawling_mode: bool,
    analysis_mode: bool,
    force_html_storage: bool,
    prompt: String,
}

impl From<&SessionState> for PersistedSession {
    fn from(session: &SessionState) -> Self {
        Self {
            tracking_enabled: session.tracking_enabled,
            crawling_mode: session.crawling_mode,
            analysis_mode: session.analysis_mode,
            force_html_storage: session.force_html_storage,
            prompt: session.prompt.clone(),
        }
    }
}

impl From<PersistedSession> for SessionState {
    fn from(persisted: PersistedSession) -> Self {
        Self {
            tracking_enabled: persisted.tracking_enabled,
            crawling_mode: persisted.crawling_mode,
            analysis_mode: persisted.analysis_mode,
            force_html_storage: persisted.force_html_storage,
            prompt: persisted.prompt,
        }
    }
}

pub(crate) fn load_session(state_dir: &Path) -> SessionState {
    let path = state_dir.join(SESSION_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return SessionState::default();
        }
        Err(err) => {
            agent_warn!("Failed to read persisted session from {:?}: {}", path, err);
            return SessionState::default();
        }
    };

    let persisted: PersistedSession = match ron::from_str(&content) {
        Ok(persisted) => persisted,
        Err(err) => {
            agent_warn!("Failed to parse persisted session from {:?}: {}", path, err);
            return SessionState::default();
        }
    };

    agent_info!("Loaded persisted session from {:?}", path);
    persisted.into()
}

pub(crate) fn save_session(state_dir: &Path, session: &SessionState) {
    if let Err(err) = ensure_state_dir(state_dir) {
        agent_error!("Failed to ensure state dir {:?}: {}", state_dir, err);
        return;
    }

    let persisted = PersistedSession::from(session);
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&persisted, pretty) {
        Ok(text) => text,
        Err(err) => {
            agent_error!("Failed to serialize session state: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    if let Err(err) = writer.write(SESSION_FILENAME, &content) {
        agent_error!("Failed to write session state to {:?}: {}", state_dir, err);
    }
}
