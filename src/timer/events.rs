use serde::Serialize;

use crate::db::models::{TimerStatus, WorkSessionInfo};

/// Broadcast payloads a stage timer emits to its subscribers. `TimeUpdated`
/// is the once-per-second display refresh and never implies a write; the
/// rest accompany persisted transitions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum TimerEvent {
    TimeUpdated {
        stage_id: String,
        minutes: u64,
    },
    StateChanged {
        stage_id: String,
        status: TimerStatus,
        minutes: u64,
    },
    SessionClosed {
        session: WorkSessionInfo,
    },
    /// The auto-pause ceiling fired: the stage is already paused and the
    /// operator owes an answer (resolved via `StageTimer::resolve_auto_pause`).
    AutoPausePrompt {
        stage_id: String,
        minutes: u64,
    },
    /// A persistence write failed after the local transition was applied.
    Desynced {
        stage_id: String,
    },
}
