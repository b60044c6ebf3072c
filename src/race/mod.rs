//! Deadline-bounded resolution.
//!
//! A [`TimedResolve`] races one lookup against a countdown timer on a shared
//! event loop. The first to finish decides the [`RaceOutcome`]; the other is
//! cancelled and completes with an aborted status that is logged but
//! otherwise ignored.

mod config;
mod coordinator;
mod sink;
mod state;

pub use config::{RaceConfig, DEFAULT_DEADLINE};
pub use coordinator::TimedResolve;
pub use sink::{AddressSink, MemorySink, StdoutSink};
pub use state::{RaceOutcome, RaceState};
