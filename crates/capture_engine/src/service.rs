use std::sync::Arc;

use agent_logging::{agent_debug, agent_error, agent_info};
use capture_core::{
    ModeChange, Request, Response, SessionState, TierUsage, UsageReport,
};

use crate::document::DocumentProvider;
use crate::probe::ProbesAuthentication;
use crate::readiness::{CaptureProgressSink, CaptureStage, RenderCapture};
use crate::storage::{BULK_QUOTA_BYTES, COMPACT_QUOTA_BYTES};
use crate::store::CaptureStore;
use crate::submit::{build_batch, ExtractionClient};

/// Best-effort receiver for mode-change notifications. Delivery is
/// fire-and-forget; implementations must not fail the caller.
pub trait NotificationSink: Send + Sync {
    fn mode_changed(&self, change: ModeChange);
}

pub struct NullNotificationSink;

impl NotificationSink for NullNotificationSink {
    fn mode_changed(&self, _change: ModeChange) {}
}

struct LogProgressSink;

impl CaptureProgressSink for LogProgressSink {
    fn stage_started(&self, stage: CaptureStage) {
        agent_debug!("render capture stage: {stage:?}");
    }
}

/// External collaborators of the dispatcher, all behind their policy traits
/// so tests can stub them out.
pub struct ServiceParts {
    pub probe: Arc<dyn ProbesAuthentication>,
    pub documents: Arc<dyn DocumentProvider>,
    pub extraction: ExtractionClient,
    pub capture: RenderCapture,
    pub notifications: Arc<dyn NotificationSink>,
}

/// The pipeline's single entry point. One instance owns the session flags
/// and the capture store; requests are handled one at a time, which keeps
/// check-then-write sequences from interleaving.
pub struct AgentService {
    session: SessionState,
    store: CaptureStore,
    parts: ServiceParts,
}

impl AgentService {
    pub fn new(session: SessionState, store: CaptureStore, parts: ServiceParts) -> Self {
        Self {
            session,
            store,
            parts,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Handles one inbound operation. Soft conditions and collaborator
    /// failures come back as response values; nothing here panics or leaves
    /// the store half-written.
    pub async fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::Navigation { url } => self.admit(&url, None).await,
            Request::CaptureHtml { url } => self.capture_and_admit(&url).await,
            Request::ListRecords => match self.store.records().await {
                Ok(records) => Response::Records { records },
                Err(err) => {
                    agent_error!("listing records failed: {err}");
                    Response::Records {
                        records: Vec::new(),
                    }
                }
            },
            Request::SetValidation { url, status } => {
                let success = match self.store.update_validation(&url, status).await {
                    Ok(success) => success,
                    Err(err) => {
                        agent_error!("validation update failed for {url}: {err}");
                        false
                    }
                };
                Response::Done { success }
            }
            Request::Remove { url } => {
                let success = match self.store.remove(&url).await {
                    Ok(success) => success,
                    Err(err) => {
                        agent_error!("remove failed for {url}: {err}");
                        false
                    }
                };
                Response::Done { success }
            }
            Request::RemoveAll => {
                let success = match self.store.remove_all().await {
                    Ok(()) => true,
                    Err(err) => {
                        agent_error!("remove-all failed: {err}");
                        false
                    }
                };
                Response::Done { success }
            }
            Request::ValidateAllPending => {
                let success = match self.store.validate_all_pending().await {
                    Ok(count) => {
                        agent_info!("validate-all advanced {count} records");
                        true
                    }
                    Err(err) => {
                        agent_error!("validate-all failed: {err}");
                        false
                    }
                };
                Response::Done { success }
            }
            Request::Submit { mode } => {
                let records = match self.store.validated_records().await {
                    Ok(records) => records,
                    Err(err) => {
                        agent_error!("gathering validated records failed: {err}");
                        return Response::Submission {
                            success: false,
                            csv: None,
                            error: Some(err.to_string()),
                        };
                    }
                };
                let batch = match build_batch(&records, mode) {
                    Ok(batch) => batch,
                    Err(err) => {
                        return Response::Submission {
                            success: false,
                            csv: None,
                            error: Some(err.to_string()),
                        }
                    }
                };
                match self.parts.extraction.process(&batch, &self.session).await {
                    Ok(csv) => Response::Submission {
                        success: true,
                        csv: Some(csv),
                        error: None,
                    },
                    Err(err) => Response::Submission {
                        success: false,
                        csv: None,
                        error: Some(err.to_string()),
                    },
                }
            }
            Request::GetUsage => match self.store.usage().await {
                Ok(report) => Response::Usage { report },
                Err(err) => {
                    agent_error!("usage computation failed: {err}");
                    Response::Usage {
                        report: UsageReport::new(
                            TierUsage::empty(COMPACT_QUOTA_BYTES),
                            TierUsage::empty(BULK_QUOTA_BYTES),
                        ),
                    }
                }
            },
            Request::SetMode { flag, enabled } => {
                let changes = self.session.set_mode(flag, enabled);
                for change in &changes {
                    self.parts.notifications.mode_changed(*change);
                }
                Response::Ack
            }
            Request::SetPrompt { prompt } => {
                self.session.set_prompt(prompt);
                Response::Ack
            }
        }
    }

    async fn admit(&mut self, url: &str, html: Option<String>) -> Response {
        let outcome = self
            .store
            .admit(url, html, &self.session, self.parts.probe.as_ref())
            .await;
        match outcome {
            Ok(admission) => Response::Admission {
                admitted: admission.admitted(),
                requires_auth: admission.snapshot_required(),
            },
            Err(err) => {
                agent_error!("admission failed for {url}: {err}");
                Response::Admission {
                    admitted: false,
                    requires_auth: false,
                }
            }
        }
    }

    /// The render-capture round trip: open the host's view of the page, run
    /// the staged capture, then admit the sanitized snapshot.
    async fn capture_and_admit(&mut self, url: &str) -> Response {
        let doc = match self.parts.documents.open(url).await {
            Ok(doc) => doc,
            Err(err) => {
                agent_error!("no document view for {url}: {err}");
                return Response::Admission {
                    admitted: false,
                    requires_auth: false,
                };
            }
        };
        let html = match self.parts.capture.capture(doc.as_ref(), &LogProgressSink).await {
            Ok(html) => html,
            Err(err) => {
                agent_error!("render capture failed for {url}: {err}");
                return Response::Admission {
                    admitted: false,
                    requires_auth: false,
                };
            }
        };
        self.admit(url, Some(html)).await
    }
}
