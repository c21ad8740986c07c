use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Four hours of continuous running before the operator is asked to confirm.
pub const DEFAULT_CEILING_MINUTES: u64 = 240;

/// Ceiling on continuous running time. The controller evaluates this on
/// every tick and forces a pause the first time a run crosses it; the
/// fired latch lives in `TimerState` so one run prompts at most once.
#[derive(Debug, Clone, Copy)]
pub struct AutoPausePolicy {
    ceiling: Duration,
}

impl Default for AutoPausePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING_MINUTES)
    }
}

impl AutoPausePolicy {
    pub fn new(ceiling_minutes: u64) -> Self {
        Self {
            ceiling: Duration::from_secs(ceiling_minutes * 60),
        }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn should_fire(&self, continuous_run: Duration) -> bool {
        continuous_run >= self.ceiling
    }
}

/// Operator's answer to the auto-pause prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoPauseChoice {
    /// Keep working: a fresh session opens and accrual continues.
    StillWorking,
    /// Done for now: the stage is finalized as stopped.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_at_and_past_the_ceiling() {
        let policy = AutoPausePolicy::new(240);
        assert!(!policy.should_fire(Duration::from_secs(239 * 60)));
        assert!(policy.should_fire(Duration::from_secs(240 * 60)));
        assert!(policy.should_fire(Duration::from_secs(241 * 60)));
    }

    #[test]
    fn default_ceiling_is_four_hours() {
        assert_eq!(
            AutoPausePolicy::default().ceiling(),
            Duration::from_secs(4 * 60 * 60)
        );
    }

    #[test]
    fn zero_ceiling_fires_immediately() {
        assert!(AutoPausePolicy::new(0).should_fire(Duration::ZERO));
    }
}
