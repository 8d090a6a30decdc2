use std::sync::Arc;

use crate::error::ConfigError;
use crate::volatility::Snapshot;

/// Scheduler phase. `Refreshing` never overlaps another `Refreshing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Refreshing,
}

/// Global state shown above the table.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum MonitorStatus {
    /// No cycle has completed yet, or the first one since a halt is running.
    #[default]
    Starting,
    Ready,
    /// Scheduling is halted until a manual retry passes preflight.
    ConfigError(ConfigError),
}

/// Everything the presentation collaborator needs, published as one value.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MonitorView {
    pub phase: Phase,
    pub status: MonitorStatus,
    /// Seconds until the next automatic refresh attempt.
    pub countdown_secs: u64,
    /// Latest complete snapshot; replaced wholesale each cycle.
    pub snapshot: Option<Arc<Snapshot>>,
}

impl MonitorView {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Refreshing
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.status, MonitorStatus::ConfigError(_))
    }

    pub fn snapshot_seq(&self) -> u64 {
        self.snapshot.as_ref().map_or(0, |s| s.seq)
    }
}
