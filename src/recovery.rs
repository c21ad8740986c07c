//! Startup recovery for sessions a crash left open.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};

use crate::db::{
    models::{SessionStatus, TimerStatus},
    Database,
};

#[derive(Debug, Clone)]
pub struct RecoveredSession {
    pub session_id: String,
    pub stage_id: String,
    pub minutes: u64,
}

/// Finalize every session still `Active` in the ledger. Each is marked
/// `Interrupted` and credited the wall-clock minutes since its start; the
/// owning stage absorbs those minutes and parks `Paused` so the operator
/// decides whether to resume. Run this before handing out controllers.
///
/// The wall-clock credit can overcount across a long outage; the
/// `Interrupted` status keeps those rows distinguishable in the ledger.
pub async fn recover_abandoned_sessions(db: &Database) -> Result<Vec<RecoveredSession>> {
    let now = Utc::now();
    let abandoned = db.get_active_sessions().await?;
    let mut recovered = Vec::with_capacity(abandoned.len());

    for session in abandoned {
        let minutes = ((now - session.started_at).num_seconds().max(0) as u64) / 60;
        warn!(
            "Recovering abandoned session {} for stage {}; crediting {} minute(s)",
            session.id, session.stage_id, minutes
        );

        db.mark_session_closed(&session.id, SessionStatus::Interrupted, minutes, now)
            .await?;

        let stage = db.get_stage(&session.stage_id).await?;
        db.update_stage_timer(
            &session.stage_id,
            TimerStatus::Paused,
            stage.time_spent_minutes + minutes,
            None,
        )
        .await?;

        recovered.push(RecoveredSession {
            session_id: session.id,
            stage_id: session.stage_id,
            minutes,
        });
    }

    if !recovered.is_empty() {
        info!("Recovered {} abandoned session(s)", recovered.len());
    }

    Ok(recovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Stage, WorkSession};
    use chrono::Duration;

    #[tokio::test]
    async fn abandoned_sessions_are_interrupted_and_credited() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("ledger.sqlite3")).expect("open database");

        let now = Utc::now();
        let started_at = now - Duration::minutes(10);

        let mut stage = Stage::new("stage-1", "Build", now - Duration::hours(1));
        stage.timer_status = TimerStatus::Running;
        stage.time_spent_minutes = 5;
        stage.timer_started_at = Some(started_at);
        db.insert_stage(&stage).await.expect("insert stage");

        db.insert_session(&WorkSession {
            id: "s-1".to_string(),
            stage_id: "stage-1".to_string(),
            started_at,
            ended_at: None,
            status: SessionStatus::Active,
            duration_minutes: None,
            created_at: started_at,
            updated_at: started_at,
        })
        .await
        .expect("insert session");

        let recovered = recover_abandoned_sessions(&db).await.expect("recover");
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].session_id, "s-1");
        assert_eq!(recovered[0].minutes, 10);

        let session = db
            .get_session("s-1")
            .await
            .expect("query")
            .expect("session present");
        assert_eq!(session.status, SessionStatus::Interrupted);
        assert_eq!(session.duration_minutes, Some(10));
        assert!(session.ended_at.is_some());

        let stage = db.get_stage("stage-1").await.expect("stage");
        assert_eq!(stage.timer_status, TimerStatus::Paused);
        assert_eq!(stage.time_spent_minutes, 15);
        assert!(stage.timer_started_at.is_none());
    }

    #[tokio::test]
    async fn recovery_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("ledger.sqlite3")).expect("open database");

        assert!(recover_abandoned_sessions(&db)
            .await
            .expect("recover on empty ledger")
            .is_empty());

        let now = Utc::now();
        db.insert_stage(&Stage::new("stage-1", "Build", now))
            .await
            .expect("insert stage");
        db.insert_session(&WorkSession {
            id: "s-1".to_string(),
            stage_id: "stage-1".to_string(),
            started_at: now - Duration::minutes(3),
            ended_at: None,
            status: SessionStatus::Active,
            duration_minutes: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("insert session");

        assert_eq!(
            recover_abandoned_sessions(&db).await.expect("first pass").len(),
            1
        );
        assert!(recover_abandoned_sessions(&db)
            .await
            .expect("second pass")
            .is_empty());
    }
}
