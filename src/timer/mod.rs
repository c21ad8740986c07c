pub mod controller;
pub mod events;
pub mod policy;
pub mod registry;
pub mod state;

pub use controller::{StageTimer, TimerInit, TimerSnapshot};
pub use events::TimerEvent;
pub use policy::{AutoPauseChoice, AutoPausePolicy};
pub use registry::TimerRegistry;
pub use state::{format_time, TimerState, TimerStatus};
