use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// Lifecycle of a committing run. `started -> running -> completed` on the
/// happy path; `failed` is the other terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Started,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One progress update from the execution service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    pub status: RunStatus,
    #[serde(default)]
    pub rows_processed: u64,
}

/// The final word on a run after its progress stream was drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    pub status: RunStatus,
    pub rows_processed: u64,
}

/// Consumes a run's progress stream until a terminal status arrives, then
/// drops the subscription. Updates received after a terminal status are
/// ignored, so a late `running` can never resurrect a finished run.
#[derive(Debug)]
pub struct RunTracker {
    run_id: String,
    status: RunStatus,
    rows_processed: u64,
}

impl RunTracker {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Started,
            rows_processed: 0,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn rows_processed(&self) -> u64 {
        self.rows_processed
    }

    /// Applies one progress update. A no-op once terminal.
    pub fn apply(&mut self, progress: &RunProgress) {
        if self.status.is_terminal() {
            return;
        }
        self.status = progress.status;
        self.rows_processed = progress.rows_processed;
    }

    /// Drains the stream until the run finishes or the sender hangs up,
    /// returning the final summary.
    pub async fn track(mut self, mut updates: mpsc::Receiver<RunProgress>) -> RunSummary {
        while !self.status.is_terminal() {
            match updates.recv().await {
                Some(progress) => self.apply(&progress),
                // Sender gone without a terminal status: keep whatever we
                // saw last rather than inventing a completion.
                None => break,
            }
        }
        drop(updates);
        debug!(
            run_id = self.run_id.as_str(),
            status = ?self.status,
            rows = self.rows_processed,
            "run tracking finished"
        );
        RunSummary {
            run_id: self.run_id,
            status: self.status,
            rows_processed: self.rows_processed,
        }
    }
}
