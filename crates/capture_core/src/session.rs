use serde::{Deserialize, Serialize};

/// Session-wide mode flags addressable through the RPC surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeFlag {
    Tracking,
    Crawl,
    Analysis,
    ForceHtml,
}

/// One flag transition that actually took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub flag: ModeFlag,
    pub enabled: bool,
}

/// Process-wide session flags, persisted across restarts by the app layer.
///
/// Invariant: `crawling_mode` and `analysis_mode` are never both true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub tracking_enabled: bool,
    pub crawling_mode: bool,
    pub analysis_mode: bool,
    pub force_html_storage: bool,
    /// Free-text extraction prompt, forwarded to the backend verbatim.
    pub prompt: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            tracking_enabled: false,
            crawling_mode: false,
            analysis_mode: false,
            force_html_storage: false,
            prompt: String::new(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a flag change and returns the transitions that took effect,
    /// including any counter-flag forced off by mutual exclusion. Idempotent:
    /// re-setting the current value returns no changes.
    pub fn set_mode(&mut self, flag: ModeFlag, enabled: bool) -> Vec<ModeChange> {
        let mut changes = Vec::new();
        match flag {
            ModeFlag::Tracking => {
                if self.tracking_enabled != enabled {
                    self.tracking_enabled = enabled;
                    changes.push(ModeChange { flag, enabled });
                }
            }
            ModeFlag::Crawl => {
                if enabled && self.analysis_mode {
                    self.analysis_mode = false;
                    changes.push(ModeChange {
                        flag: ModeFlag::Analysis,
                        enabled: false,
                    });
                }
                if self.crawling_mode != enabled {
                    self.crawling_mode = enabled;
                    changes.push(ModeChange { flag, enabled });
                }
            }
            ModeFlag::Analysis => {
                if enabled && self.crawling_mode {
                    self.crawling_mode = false;
                    changes.push(ModeChange {
                        flag: ModeFlag::Crawl,
                        enabled: false,
                    });
                }
                if self.analysis_mode != enabled {
                    self.analysis_mode = enabled;
                    changes.push(ModeChange { flag, enabled });
                }
            }
            ModeFlag::ForceHtml => {
                if self.force_html_storage != enabled {
                    self.force_html_storage = enabled;
                    changes.push(ModeChange { flag, enabled });
                }
            }
        }
        changes
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }
}
