pub mod db;
pub mod logging;
pub mod recovery;
pub mod settings;
pub mod timer;

pub use db::{
    models::{SessionStatus, Stage, TimerStatus, WorkSession, WorkSessionInfo},
    Database,
};
pub use recovery::{recover_abandoned_sessions, RecoveredSession};
pub use settings::{SettingsStore, TimerSettings};
pub use timer::{
    format_time, AutoPauseChoice, AutoPausePolicy, StageTimer, TimerEvent, TimerInit,
    TimerRegistry, TimerSnapshot,
};
