use chrono::{DateTime, Utc};
use serde::Serialize;

pub use crate::db::models::TimerStatus;

/// In-memory state for one stage's timer. The controller owns exactly one
/// of these per stage; the persisted stage row mirrors it between writes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub stage_id: String,
    pub status: TimerStatus,
    pub session_id: Option<String>,
    pub session_started_at: Option<DateTime<Utc>>,
    /// Minutes already banked by earlier closed sessions; the live session's
    /// elapsed whole minutes are added on top for the displayed total.
    pub baseline_minutes: u64,
    /// Latched once the auto-pause ceiling fires; re-armed by the next start.
    pub auto_pause_fired: bool,
    /// Set when a persistence write failed after the local transition was
    /// applied; cleared by the next fully successful transition.
    pub desynced: bool,
}

impl TimerState {
    pub fn new(stage_id: String, baseline_minutes: u64, status: TimerStatus) -> Self {
        Self {
            stage_id,
            status,
            session_id: None,
            session_started_at: None,
            baseline_minutes,
            auto_pause_fired: false,
            desynced: false,
        }
    }

    /// Whole minutes the live session has accrued so far.
    pub fn session_minutes(&self, now: DateTime<Utc>) -> Option<u64> {
        self.session_started_at
            .map(|started| whole_minutes(started, now))
    }

    pub fn current_minutes(&self, now: DateTime<Utc>) -> u64 {
        match (self.status, self.session_started_at) {
            (TimerStatus::Running, Some(started)) => {
                self.baseline_minutes + whole_minutes(started, now)
            }
            _ => self.baseline_minutes,
        }
    }

    /// Continuous running time of the live session, the quantity the
    /// auto-pause ceiling is measured against.
    pub fn continuous_run(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        match (self.status, self.session_started_at) {
            (TimerStatus::Running, Some(started)) => {
                let secs = (now - started).num_seconds().max(0) as u64;
                Some(std::time::Duration::from_secs(secs))
            }
            _ => None,
        }
    }

    pub fn begin_session(&mut self, session_id: String, started_at: DateTime<Utc>) {
        self.status = TimerStatus::Running;
        self.session_id = Some(session_id);
        self.session_started_at = Some(started_at);
        self.auto_pause_fired = false;
    }

    /// Fold the live session's whole minutes into the baseline and drop the
    /// session reference. `status` is where the stage lands (`Paused` for a
    /// suspension, `Stopped` for a completion).
    pub fn close_session(&mut self, status: TimerStatus, now: DateTime<Utc>) {
        if let Some(minutes) = self.session_minutes(now) {
            self.baseline_minutes += minutes;
        }
        self.session_id = None;
        self.session_started_at = None;
        self.status = status;
    }
}

fn whole_minutes(started: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    ((now - started).num_seconds().max(0) as u64) / 60
}

/// Zero-padded `HH:MM` rendering of a minute total.
pub fn format_time(total_minutes: u64) -> String {
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}
