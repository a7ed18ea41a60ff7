use serde::Serialize;

use crate::epoch::RenderEpoch;
use crate::theme::Theme;

/// How a pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every registered diagram was processed
    Completed,
    /// A newer pass was requested; remaining work was abandoned
    Superseded,
}

/// Summary of one render pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Epoch reserved by the pass
    pub epoch: RenderEpoch,
    /// Theme the engine was configured with (`None` if superseded before configuration)
    pub theme: Option<Theme>,
    /// Outcome
    pub outcome: PassOutcome,
    /// Diagrams in the registry snapshot
    pub total: usize,
    /// Containers updated with rendered markup
    pub rendered: usize,
    /// Containers updated with an error placeholder
    pub failed: usize,
    /// Engine results dropped because the pass had been superseded
    pub discarded: usize,
}

impl PassReport {
    pub(crate) fn started(epoch: RenderEpoch, theme: Theme, total: usize) -> Self {
        Self {
            epoch,
            theme: Some(theme),
            outcome: PassOutcome::Completed,
            total,
            rendered: 0,
            failed: 0,
            discarded: 0,
        }
    }

    pub(crate) fn superseded_before_configuration(epoch: RenderEpoch) -> Self {
        Self {
            epoch,
            theme: None,
            outcome: PassOutcome::Superseded,
            total: 0,
            rendered: 0,
            failed: 0,
            discarded: 0,
        }
    }

    pub(crate) fn supersede(mut self) -> Self {
        self.outcome = PassOutcome::Superseded;
        self
    }

    /// Whether the pass processed every diagram
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome == PassOutcome::Completed
    }
}
