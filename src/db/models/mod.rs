pub mod stage;
pub mod work_session;

pub use stage::{Stage, TimerStatus};
pub use work_session::{SessionStatus, WorkSession, WorkSessionInfo};
