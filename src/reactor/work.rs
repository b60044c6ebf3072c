//! Outstanding-work accounting for the event loop.
//!
//! The loop keeps running while at least one [`Work`] guard is alive. Both
//! the keep-alive token held by the pool runner and every scheduled
//! operation hold one. When the last guard drops, the loop is marked
//! stopped for good and every waiting worker is woken.

use crate::base::neterror::NetError;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::Notify;

const STOPPED: usize = 1 << (usize::BITS - 1);

#[derive(Debug, Default)]
pub(crate) struct WorkCount {
    // Low bits count live guards; the top bit latches once the count hits zero.
    state: AtomicUsize,
    idle: Notify,
}

impl WorkCount {
    pub(crate) fn acquire(self: &Arc<Self>) -> Result<Work, NetError> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current & STOPPED != 0 {
                return Err(NetError::LoopStopped);
            }
            match self.state.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Ok(Work {
                        count: Arc::clone(self),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn release(&self) {
        if self.state.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        // A concurrent acquire may have slipped in after the decrement; only
        // latch if the count is still zero.
        if self
            .state
            .compare_exchange(0, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::debug!("event loop out of work");
            self.idle.notify_waiters();
        }
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.state.load(Ordering::Acquire) & !STOPPED
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.state.load(Ordering::Acquire) & STOPPED != 0
    }

    /// Completes once the loop has run out of work.
    pub(crate) async fn stopped(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

/// A unit of outstanding work on the event loop.
///
/// Equivalent to asio's `io_service::work`: while any guard exists, workers
/// driving the loop keep running even if nothing is ready. Dropping the
/// guard releases it.
#[derive(Debug)]
#[must_use = "dropping a Work guard immediately releases it"]
pub struct Work {
    count: Arc<WorkCount>,
}

impl Drop for Work {
    fn drop(&mut self) {
        self.count.release();
    }
}
