//! The shared event loop and its keep-alive accounting.
//!
//! - [`EventLoop`]: runtime whose worker threads share one scheduler
//! - [`LoopHandle`]: schedules operations onto a loop
//! - [`Work`]: keep-alive guard; the loop stops when the last one drops

mod eventloop;
mod work;

pub use eventloop::{EventLoop, LoopHandle};
pub use work::Work;
