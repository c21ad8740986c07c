use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{parse_datetime, parse_optional_datetime, parse_timer_status, to_i64, to_u64},
    models::{Stage, TimerStatus},
    Database,
};

fn row_to_stage(row: &Row) -> Result<Stage> {
    let timer_status: String = row.get("timer_status")?;
    let time_spent_minutes: i64 = row.get("time_spent_minutes")?;
    let timer_started_at: Option<String> = row.get("timer_started_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Stage {
        id: row.get("id")?,
        name: row.get("name")?,
        timer_status: parse_timer_status(&timer_status)?,
        time_spent_minutes: to_u64(time_spent_minutes, "time_spent_minutes")?,
        timer_started_at: parse_optional_datetime(timer_started_at, "timer_started_at")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

const STAGE_COLUMNS: &str =
    "id, name, timer_status, time_spent_minutes, timer_started_at, created_at, updated_at";

impl Database {
    pub async fn insert_stage(&self, stage: &Stage) -> Result<()> {
        let record = stage.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO stages (id, name, timer_status, time_spent_minutes, timer_started_at, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.name,
                    record.timer_status.as_str(),
                    to_i64(record.time_spent_minutes)?,
                    record.timer_started_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_stage(&self, stage_id: &str) -> Result<Stage> {
        let stage_id = stage_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STAGE_COLUMNS} FROM stages WHERE id = ?1"
            ))?;

            let row = stmt
                .query_row(params![stage_id.clone()], |row| Ok(row_to_stage(row)))
                .optional()?;

            match row {
                Some(stage) => stage,
                None => Err(anyhow!("stage {stage_id} not found")),
            }
        })
        .await
    }

    pub async fn list_stages(&self) -> Result<Vec<Stage>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {STAGE_COLUMNS} FROM stages ORDER BY created_at ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut stages = Vec::new();
            while let Some(row) = rows.next()? {
                stages.push(row_to_stage(row)?);
            }

            Ok(stages)
        })
        .await
    }

    /// Write the stage's timer mirror fields in one statement. All three are
    /// always written: `timer_started_at` is null whenever no session is
    /// live, so callers pass the full picture rather than a partial patch.
    pub async fn update_stage_timer(
        &self,
        stage_id: &str,
        timer_status: TimerStatus,
        time_spent_minutes: u64,
        timer_started_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let stage_id = stage_id.to_string();
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE stages
                 SET timer_status = ?1,
                     time_spent_minutes = ?2,
                     timer_started_at = ?3,
                     updated_at = ?4
                 WHERE id = ?5",
                params![
                    timer_status.as_str(),
                    to_i64(time_spent_minutes)?,
                    timer_started_at.map(|dt| dt.to_rfc3339()),
                    Utc::now().to_rfc3339(),
                    stage_id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("stage {stage_id} not found"));
            }

            Ok(())
        })
        .await
    }
}
