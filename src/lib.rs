//! # timedresolve
//!
//! One-shot DNS resolution bounded by a deadline.
//!
//! A lookup and a countdown timer are started together on a shared event
//! loop; whichever finishes first wins and cancels the other. The loop is
//! driven by a fixed pool of worker threads, any of which may deliver either
//! completion.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timedresolve::runner::PoolRunner;
//!
//! fn main() -> Result<(), timedresolve::base::neterror::NetError> {
//!     let runner = PoolRunner::new(4)?;
//!     runner.start("example.com", "80");
//!     Ok(())
//!     // dropping `runner` waits for the race and joins the workers
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`dns`] - Resolver trait and backends
//! - [`reactor`] - Event loop and keep-alive accounting
//! - [`race`] - The timer-vs-lookup race
//! - [`runner`] - Worker pool driving the loop

pub mod base;
pub mod dns;
pub mod race;
pub mod reactor;
pub mod runner;
