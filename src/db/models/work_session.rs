//! Ledger-row models for work sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Interrupted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "Active",
            SessionStatus::Paused => "Paused",
            SessionStatus::Completed => "Completed",
            SessionStatus::Interrupted => "Interrupted",
        }
    }

    /// A session in any of these states has left `Active` for good and
    /// carries a final `duration_minutes`.
    pub fn is_closed(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// One contiguous interval of timer accrual for a stage. Rows are only ever
/// inserted and status-advanced; the ledger is the audit trail and nothing
/// deletes from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: String,
    pub stage_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub duration_minutes: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSessionInfo {
    pub id: String,
    pub stage_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub duration_minutes: Option<u64>,
}

impl From<WorkSession> for WorkSessionInfo {
    fn from(session: WorkSession) -> Self {
        Self {
            id: session.id,
            stage_id: session.stage_id,
            started_at: session.started_at,
            ended_at: session.ended_at,
            status: session.status,
            duration_minutes: session.duration_minutes,
        }
    }
}
