use super::{
    config::RaceConfig,
    sink::AddressSink,
    state::{RaceOutcome, RaceState, StateCell},
};
use crate::base::neterror::NetError;
use crate::dns::{service_port, Name, Resolve};
use crate::reactor::LoopHandle;
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::{watch, Notify};

/// Resolves one hostname against a deadline.
///
/// [`begin`](Self::begin) schedules two operations on the event loop: a
/// countdown timer and the lookup. Whichever completes first moves the
/// completion flag out of `Pending` and cancels the other. Cancellation is
/// advisory: the cancelled side still completes, with [`NetError::Aborted`],
/// and may even report a real result if it was already finishing. Both
/// handlers therefore check the flag before doing anything visible, so only
/// the winner emits or records an outcome.
///
/// Each scheduled operation holds a reference to the shared state, which
/// stays alive until both have completed even if every `TimedResolve`
/// handle is dropped first.
///
/// A coordinator runs exactly one race; a second `begin` is rejected.
pub struct TimedResolve<R> {
    inner: Arc<Inner<R>>,
}

struct Inner<R> {
    event_loop: LoopHandle,
    resolver: R,
    sink: Arc<dyn AddressSink>,
    config: RaceConfig,
    armed: AtomicBool,
    state: StateCell,
    cancel_timer: Notify,
    cancel_resolve: Notify,
    outcome: watch::Sender<RaceOutcome>,
}

impl<R> Clone for TimedResolve<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resolve + 'static> TimedResolve<R> {
    /// Creates an unarmed coordinator bound to `event_loop`.
    pub fn new(
        event_loop: LoopHandle,
        resolver: R,
        sink: Arc<dyn AddressSink>,
        config: RaceConfig,
    ) -> Self {
        let (outcome, _) = watch::channel(RaceOutcome::Pending);
        Self {
            inner: Arc::new(Inner {
                event_loop,
                resolver,
                sink,
                config,
                armed: AtomicBool::new(false),
                state: StateCell::default(),
                cancel_timer: Notify::new(),
                cancel_resolve: Notify::new(),
                outcome,
            }),
        }
    }

    /// Arms the timer and the lookup for `hostname:port`.
    ///
    /// Returns immediately. `false` means nothing was scheduled: the loop
    /// was already stopped, the input was malformed, or this coordinator
    /// was already armed. The reason is logged.
    pub fn begin(&self, hostname: &str, port: &str) -> bool {
        match self.arm(hostname, port) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    host = %hostname,
                    port = %port,
                    error = %e,
                    code = e.as_i32(),
                    "failed to start resolution"
                );
                false
            }
        }
    }

    fn arm(&self, hostname: &str, port: &str) -> Result<(), NetError> {
        let inner = &self.inner;
        if inner.event_loop.is_stopped() {
            return Err(NetError::LoopStopped);
        }

        let name = Name::parse(hostname)?;
        let port = service_port(port)?;

        // Both guards up front so we never schedule only one side.
        let timer_work = inner.event_loop.work()?;
        let resolve_work = inner.event_loop.work()?;

        if inner.armed.swap(true, Ordering::AcqRel) {
            return Err(NetError::AlreadyArmed);
        }

        tracing::debug!(
            host = %name,
            port,
            deadline = ?inner.config.deadline,
            "arming timer and resolver"
        );

        let this = Arc::clone(inner);
        let timer_name = name.clone();
        inner.event_loop.spawn_with(timer_work, async move {
            let status = tokio::select! {
                biased;
                _ = this.cancel_timer.notified() => Err(NetError::Aborted),
                _ = tokio::time::sleep(this.config.deadline) => Ok(()),
            };
            this.on_timer(&timer_name, status);
        });

        let this = Arc::clone(inner);
        inner.event_loop.spawn_with(resolve_work, async move {
            let lookup = this.resolver.resolve(name.clone());
            let result = tokio::select! {
                biased;
                _ = this.cancel_resolve.notified() => Err(NetError::Aborted),
                addrs = lookup => addrs.map(|addrs| {
                    addrs
                        .map(|addr| SocketAddr::new(addr.ip(), port))
                        .collect::<Vec<_>>()
                }),
            };
            this.on_resolve(&name, result);
        });

        Ok(())
    }

    /// Current completion flag.
    pub fn state(&self) -> RaceState {
        self.inner.state.load()
    }

    /// Snapshot of the outcome so far.
    pub fn outcome(&self) -> RaceOutcome {
        self.inner.outcome.borrow().clone()
    }

    /// Subscribes to outcome changes.
    pub fn subscribe(&self) -> watch::Receiver<RaceOutcome> {
        self.inner.outcome.subscribe()
    }

    /// Waits until the race is decided.
    ///
    /// Every armed race is eventually decided, at the latest when the
    /// deadline elapses. Never completes for a coordinator that was not
    /// armed.
    pub async fn decided(&self) -> RaceOutcome {
        let mut rx = self.subscribe();
        let decided = match rx.wait_for(|outcome| !outcome.is_pending()).await {
            Ok(outcome) => outcome.clone(),
            // The sender lives as long as `self`.
            Err(_) => self.outcome(),
        };
        decided
    }

    /// Whether [`begin`](Self::begin) has successfully armed this coordinator.
    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &RaceConfig {
        &self.inner.config
    }
}

impl<R> Inner<R> {
    fn on_timer(&self, name: &Name, status: Result<(), NetError>) {
        match &status {
            Ok(()) => tracing::info!(host = %name, status = "expired", "timer fired"),
            Err(e) => tracing::info!(host = %name, status = %e, "timer fired"),
        }

        if status.is_err() {
            // Cancelled: the resolver already won.
            return;
        }

        if self.state.finish(RaceState::TimedOut) {
            let err = NetError::TimedOut;
            tracing::warn!(
                host = %name,
                deadline = ?self.config.deadline,
                error = %err,
                code = err.as_i32(),
                "deadline exceeded, cancelling resolution"
            );
            self.cancel_resolve.notify_one();
            self.outcome.send_replace(RaceOutcome::TimedOut);
        } else {
            tracing::debug!(host = %name, state = ?self.state.load(), "timer expired after race was decided");
        }
    }

    fn on_resolve(&self, name: &Name, result: Result<Vec<SocketAddr>, NetError>) {
        match result {
            Ok(addrs) if addrs.is_empty() => {
                // Not a win; the deadline still governs.
                tracing::debug!(host = %name, "lookup returned no addresses");
            }
            Ok(addrs) => {
                if !self.state.finish(RaceState::Resolved) {
                    tracing::debug!(
                        host = %name,
                        state = ?self.state.load(),
                        "lookup finished after race was decided, discarding"
                    );
                    return;
                }
                self.cancel_timer.notify_one();
                tracing::info!(host = %name, count = addrs.len(), "resolved before deadline");
                for addr in &addrs {
                    self.sink.emit(*addr);
                }
                self.outcome.send_replace(RaceOutcome::Resolved(addrs));
            }
            Err(e) if e.is_aborted() => {
                tracing::info!(host = %name, error = %e, "resolver error");
            }
            Err(e) => {
                tracing::error!(host = %name, error = %e, code = e.as_i32(), "resolver error");
                if self.state.finish(RaceState::Failed) {
                    self.outcome.send_replace(RaceOutcome::Failed(e));
                }
            }
        }
    }
}

impl<R> Drop for Inner<R> {
    fn drop(&mut self) {
        tracing::debug!(state = ?self.state.load(), "race coordinator released");
    }
}

impl<R> std::fmt::Debug for TimedResolve<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedResolve")
            .field("state", &self.inner.state.load())
            .field("armed", &self.inner.armed.load(Ordering::Acquire))
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
