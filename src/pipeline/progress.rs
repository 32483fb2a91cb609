//! Progress notifications for a pipeline run.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Stage of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    #[default]
    Idle,
    ResolvingIdentity,
    ListingMatches,
    FetchingDetails,
    Aggregating,
    Completed,
    Failed,
}

impl PipelineStage {
    /// True while a run is in flight.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            PipelineStage::Idle | PipelineStage::Completed | PipelineStage::Failed
        )
    }
}

/// Notification sent to the observer of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    Stage { stage: PipelineStage },
    Progress { percent: u8 },
}

/// Forwards events to an optional observer, dropping progress values that
/// would move backwards.
pub(crate) struct ProgressReporter {
    sender: Option<UnboundedSender<PipelineEvent>>,
    last_percent: u8,
}

impl ProgressReporter {
    pub fn new(sender: Option<UnboundedSender<PipelineEvent>>) -> Self {
        Self {
            sender,
            last_percent: 0,
        }
    }

    pub fn progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent <= self.last_percent {
            return;
        }
        self.last_percent = percent;
        self.send(PipelineEvent::Progress { percent });
    }

    pub fn stage(&mut self, stage: PipelineStage) {
        self.send(PipelineEvent::Stage { stage });
    }

    #[cfg(test)]
    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    fn send(&self, event: PipelineEvent) {
        if let Some(sender) = &self.sender {
            // Observer may have gone away; the run carries on regardless.
            let _ = sender.send(event);
        }
    }
}

/// Percentage reached after `fetched` of `total` listed ids were processed.
pub(crate) fn detail_progress(fetched: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (30 + fetched.min(total) * 70 / total) as u8
}
