//! Worker pool that drives the shared event loop for one race.

mod config;
mod pool;

pub use config::{default_threads, RunnerConfig};
pub use pool::PoolRunner;
