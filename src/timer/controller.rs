use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    time,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::{
    models::{SessionStatus, TimerStatus, WorkSession, WorkSessionInfo},
    Database,
};

use super::{
    events::TimerEvent,
    policy::{AutoPauseChoice, AutoPausePolicy},
    state::TimerState,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Seed values for a controller, taken from the persisted stage row so a
/// reload resumes display where it left off rather than from zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerInit {
    pub initial_minutes: u64,
    pub initial_status: TimerStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub stage_id: String,
    pub status: TimerStatus,
    pub time_spent_minutes: u64,
    pub session_id: Option<String>,
    pub auto_pause_pending: bool,
    pub desynced: bool,
}

/// Tracks working time for exactly one stage. The controller is the sole
/// writer of its stage's ledger rows and timer mirror fields; callers await
/// its methods serially and subscribe for display updates.
#[derive(Clone)]
pub struct StageTimer {
    stage_id: String,
    state: Arc<Mutex<TimerState>>,
    db: Database,
    policy: AutoPausePolicy,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<Mutex<Option<CancellationToken>>>,
    tick_interval: Duration,
}

impl StageTimer {
    pub fn new(
        db: Database,
        stage_id: impl Into<String>,
        init: TimerInit,
        policy: AutoPausePolicy,
    ) -> Self {
        let stage_id = stage_id.into();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state: Arc::new(Mutex::new(TimerState::new(
                stage_id.clone(),
                init.initial_minutes,
                init.initial_status,
            ))),
            stage_id,
            db,
            policy,
            events,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn stage_id(&self) -> &str {
        &self.stage_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let state = self.state.lock().await;
        TimerSnapshot {
            stage_id: state.stage_id.clone(),
            status: state.status,
            time_spent_minutes: state.current_minutes(Utc::now()),
            session_id: state.session_id.clone(),
            auto_pause_pending: state.auto_pause_fired && state.status == TimerStatus::Paused,
            desynced: state.desynced,
        }
    }

    pub async fn time_spent(&self) -> u64 {
        self.state.lock().await.current_minutes(Utc::now())
    }

    /// Open a new work session and mark the stage running. Valid from
    /// `stopped` and `paused`; with a session already live this is a no-op,
    /// keeping one active ledger row per stage.
    pub async fn start(&self) -> Result<()> {
        let started_at = Utc::now();
        let (session, baseline) = {
            let mut state = self.state.lock().await;
            if state.status == TimerStatus::Running && state.session_id.is_some() {
                return Ok(());
            }

            let session = WorkSession {
                id: Uuid::new_v4().to_string(),
                stage_id: self.stage_id.clone(),
                started_at,
                ended_at: None,
                status: SessionStatus::Active,
                duration_minutes: None,
                created_at: started_at,
                updated_at: started_at,
            };
            state.begin_session(session.id.clone(), started_at);
            (session, state.baseline_minutes)
        };

        info!(
            "Starting session {} for stage {}",
            session.id, self.stage_id
        );

        let written = async {
            self.db.insert_session(&session).await?;
            self.db
                .update_stage_timer(
                    &self.stage_id,
                    TimerStatus::Running,
                    baseline,
                    Some(started_at),
                )
                .await
        }
        .await;

        let outcome = self.settle(written).await;
        self.spawn_ticker().await;
        self.emit_state_changed().await;
        outcome
    }

    /// Suspend the live session. Resuming later goes through `start()` and
    /// opens a fresh session; a paused session is never reopened.
    pub async fn pause(&self) -> Result<()> {
        self.close_session(SessionStatus::Paused, TimerStatus::Paused)
            .await
    }

    /// Complete the live session and stop the stage.
    pub async fn stop(&self) -> Result<()> {
        self.close_session(SessionStatus::Completed, TimerStatus::Stopped)
            .await
    }

    /// Close out a paused stage without a live session, e.g. after the
    /// operator answers the auto-pause prompt with "stop". Writes only the
    /// stage row; the ledger was already settled by the pause.
    pub async fn finalize(&self) -> Result<()> {
        let total = {
            let mut state = self.state.lock().await;
            if state.status != TimerStatus::Paused || state.session_id.is_some() {
                return Ok(());
            }
            state.status = TimerStatus::Stopped;
            state.auto_pause_fired = false;
            state.baseline_minutes
        };

        let written = self
            .db
            .update_stage_timer(&self.stage_id, TimerStatus::Stopped, total, None)
            .await;

        let outcome = self.settle(written).await;
        self.emit_state_changed().await;
        outcome
    }

    pub async fn resolve_auto_pause(&self, choice: AutoPauseChoice) -> Result<()> {
        match choice {
            AutoPauseChoice::StillWorking => self.start().await,
            AutoPauseChoice::Stop => self.finalize().await,
        }
    }

    /// Cancel the ticker and drop the display loop. Ledger state is left
    /// as-is; a controller for this stage can be rebuilt from the row.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }

    async fn close_session(
        &self,
        session_status: SessionStatus,
        stage_status: TimerStatus,
    ) -> Result<()> {
        let ended_at = Utc::now();
        let (session_id, started_at, minutes, new_total) = {
            let mut state = self.state.lock().await;
            let (Some(session_id), Some(started_at)) =
                (state.session_id.clone(), state.session_started_at)
            else {
                // No live session reference: nothing to write.
                return Ok(());
            };

            let minutes = state.session_minutes(ended_at).unwrap_or(0);
            state.close_session(stage_status, ended_at);
            (session_id, started_at, minutes, state.baseline_minutes)
        };

        self.cancel_ticker().await;

        info!(
            "Closing session {session_id} for stage {} as {} ({minutes} minute(s), total {new_total})",
            self.stage_id,
            session_status.as_str(),
        );

        let written = async {
            self.db
                .mark_session_closed(&session_id, session_status, minutes, ended_at)
                .await?;
            self.db
                .update_stage_timer(&self.stage_id, stage_status, new_total, None)
                .await
        }
        .await;

        let outcome = self.settle(written).await;

        let _ = self.events.send(TimerEvent::SessionClosed {
            session: WorkSessionInfo {
                id: session_id,
                stage_id: self.stage_id.clone(),
                started_at,
                ended_at: Some(ended_at),
                status: session_status,
                duration_minutes: Some(minutes),
            },
        });
        self.emit_state_changed().await;
        outcome
    }

    /// Reconcile the optimistic transition with the write outcome. The local
    /// state stands either way; a failure flips the desynced flag until the
    /// next transition persists cleanly.
    async fn settle(&self, written: Result<()>) -> Result<()> {
        let mut state = self.state.lock().await;
        match written {
            Ok(()) => {
                state.desynced = false;
                Ok(())
            }
            Err(err) => {
                state.desynced = true;
                error!(
                    "Persistence failed for stage {}; local timer state is ahead of the ledger: {err:#}",
                    self.stage_id
                );
                let _ = self.events.send(TimerEvent::Desynced {
                    stage_id: self.stage_id.clone(),
                });
                Err(err)
            }
        }
    }

    async fn emit_state_changed(&self) {
        let state = self.state.lock().await;
        let _ = self.events.send(TimerEvent::StateChanged {
            stage_id: state.stage_id.clone(),
            status: state.status,
            minutes: state.current_minutes(Utc::now()),
        });
    }

    async fn spawn_ticker(&self) {
        let mut guard = self.ticker.lock().await;
        if let Some(previous) = guard.take() {
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let timer = self.clone();

        tokio::spawn(async move {
            let mut interval = time::interval(timer.tick_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let (minutes, fire) = {
                    let state = timer.state.lock().await;
                    if state.status != TimerStatus::Running {
                        break;
                    }
                    let now = Utc::now();
                    let minutes = state.current_minutes(now);
                    let fire = !state.auto_pause_fired
                        && state
                            .continuous_run(now)
                            .map(|run| timer.policy.should_fire(run))
                            .unwrap_or(false);
                    (minutes, fire)
                };

                let _ = timer.events.send(TimerEvent::TimeUpdated {
                    stage_id: timer.stage_id.clone(),
                    minutes,
                });

                if fire {
                    // Latch before the writes so a slow pause cannot refire
                    // on the next tick.
                    {
                        let mut state = timer.state.lock().await;
                        state.auto_pause_fired = true;
                    }

                    warn!(
                        "Continuous run hit the auto-pause ceiling for stage {}; pausing",
                        timer.stage_id
                    );

                    if let Err(err) = timer
                        .close_session(SessionStatus::Paused, TimerStatus::Paused)
                        .await
                    {
                        error!(
                            "Auto-pause persistence failed for stage {}: {err:#}",
                            timer.stage_id
                        );
                    }

                    let _ = timer.events.send(TimerEvent::AutoPausePrompt {
                        stage_id: timer.stage_id.clone(),
                        minutes,
                    });
                    break;
                }
            }
        });

        *guard = Some(cancel);
    }

    async fn cancel_ticker(&self) {
        if let Some(cancel) = self.ticker.lock().await.take() {
            cancel.cancel();
        }
    }
}
