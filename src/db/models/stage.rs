//! Stage rows and the persisted timer vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted mirror of a stage controller's current state, kept so a reload
/// can resume display where it left off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Stopped,
    Running,
    Paused,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Stopped
    }
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Stopped => "Stopped",
            TimerStatus::Running => "Running",
            TimerStatus::Paused => "Paused",
        }
    }
}

/// Timer-relevant subset of a project stage.
///
/// Invariant: `time_spent_minutes` equals the sum of `duration_minutes`
/// over the stage's closed work sessions, plus the whole minutes elapsed
/// since `timer_started_at` while a session is live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub timer_status: TimerStatus,
    pub time_spent_minutes: u64,
    pub timer_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stage {
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            timer_status: TimerStatus::Stopped,
            time_spent_minutes: 0,
            timer_started_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
