use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use tokio::sync::Mutex;

use crate::db::Database;

use super::{
    controller::{StageTimer, TimerInit},
    policy::AutoPausePolicy,
};

/// Owned map from stage id to its timer controller. One controller per open
/// stage; stages time independently with no cross-talk. The registry is a
/// plain value the embedding application owns and drops, not a process-wide
/// singleton.
pub struct TimerRegistry {
    db: Database,
    policy: AutoPausePolicy,
    timers: Mutex<HashMap<String, Arc<StageTimer>>>,
}

impl TimerRegistry {
    pub fn new(db: Database, policy: AutoPausePolicy) -> Self {
        Self {
            db,
            policy,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Get or build the controller for a stage. A new controller is seeded
    /// from the persisted stage row, so a reopened stage resumes display
    /// from its last persisted total and status.
    pub async fn acquire(&self, stage_id: &str) -> Result<Arc<StageTimer>> {
        let mut timers = self.timers.lock().await;
        if let Some(timer) = timers.get(stage_id) {
            return Ok(timer.clone());
        }

        let stage = self.db.get_stage(stage_id).await?;
        let timer = Arc::new(StageTimer::new(
            self.db.clone(),
            stage_id,
            TimerInit {
                initial_minutes: stage.time_spent_minutes,
                initial_status: stage.timer_status,
            },
            self.policy,
        ));
        timers.insert(stage_id.to_string(), timer.clone());
        Ok(timer)
    }

    /// Drop a stage's controller and cancel its ticker. Ledger state is
    /// untouched; `acquire` rebuilds from the row.
    pub async fn release(&self, stage_id: &str) {
        let removed = self.timers.lock().await.remove(stage_id);
        if let Some(timer) = removed {
            timer.shutdown().await;
        }
    }

    pub async fn shutdown(&self) {
        let timers: Vec<_> = self
            .timers
            .lock()
            .await
            .drain()
            .map(|(_, timer)| timer)
            .collect();
        for timer in timers {
            timer.shutdown().await;
        }
    }
}
