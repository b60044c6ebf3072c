//! Pool runner configuration.

use crate::race::RaceConfig;
use std::{num::NonZeroUsize, thread, time::Duration};

/// Worker pool settings.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Number of worker threads driving the event loop
    pub threads: usize,
    /// Prefix for worker thread names
    pub thread_name: String,
    /// How long teardown waits for abandoned blocking lookups
    pub shutdown_grace: Duration,
    /// Settings for the race itself
    pub race: RaceConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            thread_name: "resolve-worker".to_string(),
            shutdown_grace: Duration::from_millis(500),
            race: RaceConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count. Zero is treated as one.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set the worker thread name prefix.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the shutdown grace period.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Set the race deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.race = self.race.deadline(deadline);
        self
    }

    /// Replace the race settings.
    pub fn race(mut self, race: RaceConfig) -> Self {
        self.race = race;
        self
    }
}

/// Available hardware parallelism, or 1 when it can't be determined.
pub fn default_threads() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert!(config.threads >= 1);
        assert_eq!(config.threads, default_threads());
        assert_eq!(config.thread_name, "resolve-worker");
        assert_eq!(config.race.deadline, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_pattern() {
        let config = RunnerConfig::new()
            .threads(0)
            .thread_name("w")
            .deadline(Duration::from_millis(200))
            .shutdown_grace(Duration::from_millis(50));

        assert_eq!(config.threads, 1);
        assert_eq!(config.thread_name, "w");
        assert_eq!(config.race.deadline, Duration::from_millis(200));
        assert_eq!(config.shutdown_grace, Duration::from_millis(50));
    }
}
