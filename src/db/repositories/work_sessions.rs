use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{
        parse_datetime, parse_optional_datetime, parse_session_status, to_i64, to_optional_u64,
    },
    models::{SessionStatus, WorkSession},
    Database,
};

fn row_to_session(row: &Row) -> Result<WorkSession> {
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let status: String = row.get("status")?;
    let duration_minutes: Option<i64> = row.get("duration_minutes")?;

    Ok(WorkSession {
        id: row.get("id")?,
        stage_id: row.get("stage_id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        status: parse_session_status(&status)?,
        duration_minutes: to_optional_u64(duration_minutes, "duration_minutes")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

const SESSION_COLUMNS: &str =
    "id, stage_id, started_at, ended_at, status, duration_minutes, created_at, updated_at";

impl Database {
    pub async fn insert_session(&self, session: &WorkSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO work_sessions (id, stage_id, started_at, ended_at, status, duration_minutes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.stage_id,
                    record.started_at.to_rfc3339(),
                    record.ended_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.status.as_str(),
                    record.duration_minutes.map(to_i64).transpose()?,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Move a session out of `Active`, recording its final duration and end
    /// time. Paused sessions get an `ended_at` too; `status` alone tells a
    /// suspended session from a finished one.
    pub async fn mark_session_closed(
        &self,
        session_id: &str,
        status: SessionStatus,
        duration_minutes: u64,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        if !status.is_closed() {
            bail!("cannot close a session back to {}", status.as_str());
        }

        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE work_sessions
                 SET status = ?1,
                     duration_minutes = ?2,
                     ended_at = ?3,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    status.as_str(),
                    to_i64(duration_minutes)?,
                    ended_at.to_rfc3339(),
                    ended_at.to_rfc3339(),
                    session_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<WorkSession>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM work_sessions WHERE id = ?1"
            ))?;

            let row = stmt
                .query_row(params![session_id], |row| Ok(row_to_session(row)))
                .optional()?;
            row.transpose()
        })
        .await
    }

    pub async fn get_active_session(&self, stage_id: &str) -> Result<Option<WorkSession>> {
        let stage_id = stage_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM work_sessions
                 WHERE stage_id = ?1 AND status = 'Active'
                 ORDER BY started_at DESC
                 LIMIT 1"
            ))?;

            let row = stmt
                .query_row(params![stage_id], |row| Ok(row_to_session(row)))
                .optional()?;
            row.transpose()
        })
        .await
    }

    /// Sessions left `Active` across a restart; input to the recovery pass.
    pub async fn get_active_sessions(&self) -> Result<Vec<WorkSession>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM work_sessions
                 WHERE status = 'Active'
                 ORDER BY started_at ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    pub async fn list_sessions_for_stage(
        &self,
        stage_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WorkSession>> {
        let stage_id = stage_id.to_string();
        let limit = limit as i64;
        let offset = offset as i64;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM work_sessions
                 WHERE stage_id = ?1
                 ORDER BY started_at DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;

            let mut rows = stmt.query(params![stage_id, limit, offset])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    /// Ledger total for a stage: sum of `duration_minutes` over its closed
    /// sessions. The stage row's `time_spent_minutes` mirrors this value.
    pub async fn sum_session_minutes(&self, stage_id: &str) -> Result<u64> {
        let stage_id = stage_id.to_string();
        self.execute(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COALESCE(SUM(duration_minutes), 0)
                 FROM work_sessions
                 WHERE stage_id = ?1 AND status != 'Active'",
                params![stage_id],
                |row| row.get(0),
            )?;
            Ok(total.max(0) as u64)
        })
        .await
    }
}
