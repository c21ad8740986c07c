mod stages;
mod work_sessions;

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use tempfile::TempDir;

    use crate::db::{
        models::{SessionStatus, Stage, TimerStatus, WorkSession},
        Database,
    };

    fn open_db() -> (TempDir, Database) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(dir.path().join("ledger.sqlite3")).expect("open database");
        (dir, db)
    }

    fn sample_session(id: &str, stage_id: &str, started_at: DateTime<Utc>) -> WorkSession {
        WorkSession {
            id: id.to_string(),
            stage_id: stage_id.to_string(),
            started_at,
            ended_at: None,
            status: SessionStatus::Active,
            duration_minutes: None,
            created_at: started_at,
            updated_at: started_at,
        }
    }

    #[tokio::test]
    async fn stage_roundtrip() {
        let (_dir, db) = open_db();
        let stage = Stage::new("stage-1", "Discovery", Utc::now());
        db.insert_stage(&stage).await.expect("insert stage");

        let loaded = db.get_stage("stage-1").await.expect("get stage");
        assert_eq!(loaded.name, "Discovery");
        assert_eq!(loaded.timer_status, TimerStatus::Stopped);
        assert_eq!(loaded.time_spent_minutes, 0);
        assert!(loaded.timer_started_at.is_none());

        assert_eq!(db.list_stages().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn update_stage_timer_rejects_unknown_stage() {
        let (_dir, db) = open_db();
        let err = db
            .update_stage_timer("missing", TimerStatus::Running, 0, Some(Utc::now()))
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn session_insert_requires_existing_stage() {
        let (_dir, db) = open_db();
        let result = db
            .insert_session(&sample_session("s-1", "missing", Utc::now()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn session_close_lifecycle() {
        let (_dir, db) = open_db();
        let now = Utc::now();
        db.insert_stage(&Stage::new("stage-1", "Build", now))
            .await
            .expect("insert stage");

        let session = sample_session("s-1", "stage-1", now - Duration::seconds(125));
        db.insert_session(&session).await.expect("insert session");

        let active = db
            .get_active_session("stage-1")
            .await
            .expect("query")
            .expect("active session present");
        assert_eq!(active.id, "s-1");
        assert!(active.ended_at.is_none());
        assert!(active.duration_minutes.is_none());

        db.mark_session_closed("s-1", SessionStatus::Paused, 2, now)
            .await
            .expect("close session");

        let closed = db
            .get_session("s-1")
            .await
            .expect("query")
            .expect("session present");
        assert_eq!(closed.status, SessionStatus::Paused);
        assert_eq!(closed.duration_minutes, Some(2));
        assert_eq!(closed.ended_at, Some(now));

        assert!(db
            .get_active_session("stage-1")
            .await
            .expect("query")
            .is_none());
        assert_eq!(db.sum_session_minutes("stage-1").await.expect("sum"), 2);
    }

    #[tokio::test]
    async fn close_back_to_active_is_rejected() {
        let (_dir, db) = open_db();
        let err = db
            .mark_session_closed("s-1", SessionStatus::Active, 0, Utc::now())
            .await
            .expect_err("should fail");
        assert!(err.to_string().contains("cannot close"));
    }

    #[tokio::test]
    async fn sum_skips_live_sessions() {
        let (_dir, db) = open_db();
        let now = Utc::now();
        db.insert_stage(&Stage::new("stage-1", "Build", now))
            .await
            .expect("insert stage");

        db.insert_session(&sample_session("s-1", "stage-1", now - Duration::minutes(30)))
            .await
            .expect("insert");
        db.mark_session_closed("s-1", SessionStatus::Completed, 25, now)
            .await
            .expect("close");
        db.insert_session(&sample_session("s-2", "stage-1", now))
            .await
            .expect("insert live");

        assert_eq!(db.sum_session_minutes("stage-1").await.expect("sum"), 25);
        assert_eq!(db.get_active_sessions().await.expect("open").len(), 1);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_paginated() {
        let (_dir, db) = open_db();
        let now = Utc::now();
        db.insert_stage(&Stage::new("stage-1", "Build", now))
            .await
            .expect("insert stage");

        for (index, offset_minutes) in [30i64, 20, 10].iter().enumerate() {
            let session = sample_session(
                &format!("s-{index}"),
                "stage-1",
                now - Duration::minutes(*offset_minutes),
            );
            db.insert_session(&session).await.expect("insert");
        }

        let first_page = db
            .list_sessions_for_stage("stage-1", 2, 0)
            .await
            .expect("list");
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[0].id, "s-2");
        assert_eq!(first_page[1].id, "s-1");

        let second_page = db
            .list_sessions_for_stage("stage-1", 2, 2)
            .await
            .expect("list");
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].id, "s-0");
    }
}
