//! Race configuration.

use std::time::Duration;

/// How long the resolver gets before the race is called for the timer.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Per-race settings.
#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Time allowed for the lookup
    pub deadline: Duration,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl RaceConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}
