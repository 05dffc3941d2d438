use serde::{Deserialize, Serialize};

/// Lifecycle of one search session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Next advance resets state and starts a fresh run
    #[default]
    Beginning,
    /// Search in progress
    Running,
    /// Search finished; further advances are no-ops until restarted
    Done,
}

impl Lifecycle {
    pub fn is_done(&self) -> bool {
        matches!(self, Lifecycle::Done)
    }
}
