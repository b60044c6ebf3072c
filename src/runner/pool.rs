use super::config::RunnerConfig;
use crate::base::neterror::NetError;
use crate::dns::{GaiResolver, Resolve};
use crate::race::{AddressSink, StdoutSink, TimedResolve};
use crate::reactor::{EventLoop, Work};
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// Drives one [`TimedResolve`] on a fixed pool of worker threads.
///
/// Construction starts the workers. They all pull from the same
/// [`EventLoop`] and keep doing so until the keep-alive token is released
/// with [`stop`](Self::stop) *and* the race's operations have completed.
/// Dropping the runner (or calling [`join`](Self::join)) stops it and then
/// blocks until every worker has returned.
///
/// Teardown must not run inside an async context, since it blocks.
///
/// # Example
///
/// ```rust,ignore
/// use timedresolve::runner::PoolRunner;
///
/// let runner = PoolRunner::new(4)?;
/// runner.start("example.com", "80");
/// // dropping the runner waits for the race to finish
/// ```
pub struct PoolRunner<R: Resolve + 'static = GaiResolver> {
    event_loop: Option<EventLoop>,
    work: Option<Work>,
    command: TimedResolve<R>,
    config: RunnerConfig,
}

impl PoolRunner<GaiResolver> {
    /// Starts `threads` workers racing the system resolver, printing
    /// results to stdout.
    pub fn new(threads: usize) -> Result<Self, NetError> {
        Self::with_config(RunnerConfig::new().threads(threads))
    }

    /// Like [`new`](Self::new) with full configuration.
    pub fn with_config(config: RunnerConfig) -> Result<Self, NetError> {
        Self::with_resolver(config, GaiResolver::new(), Arc::new(StdoutSink))
    }
}

impl<R: Resolve + 'static> PoolRunner<R> {
    /// Starts the pool with a custom resolver and address sink.
    pub fn with_resolver(
        config: RunnerConfig,
        resolver: R,
        sink: Arc<dyn AddressSink>,
    ) -> Result<Self, NetError> {
        tracing::info!(threads = config.threads, "Starting worker threads");
        let event_loop = EventLoop::new(config.threads, &config.thread_name)?;
        let work = event_loop.handle().work()?;
        let command = TimedResolve::new(
            event_loop.handle().clone(),
            resolver,
            sink,
            config.race.clone(),
        );

        Ok(Self {
            event_loop: Some(event_loop),
            work: Some(work),
            command,
            config,
        })
    }

    /// Begins the race for `hostname:port`. See [`TimedResolve::begin`].
    pub fn start(&self, hostname: &str, port: &str) -> bool {
        self.command.begin(hostname, port)
    }

    /// Releases the keep-alive token so workers return once the race's
    /// operations are done. Idempotent.
    pub fn stop(&mut self) {
        if self.work.take().is_some() {
            tracing::debug!("keep-alive released");
        }
    }

    /// The coordinator this runner drives.
    pub fn command(&self) -> &TimedResolve<R> {
        &self.command
    }

    /// Number of worker threads not yet joined.
    pub fn worker_count(&self) -> usize {
        self.event_loop.as_ref().map_or(0, EventLoop::workers)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Stops the pool and waits for every worker. Returns how many were
    /// joined.
    pub fn join(mut self) -> usize {
        self.teardown()
    }

    fn teardown(&mut self) -> usize {
        let Some(event_loop) = self.event_loop.take() else {
            return 0;
        };

        self.stop();
        event_loop.run();

        let joined = event_loop.workers();
        let lingering = event_loop.shutdown(self.config.shutdown_grace);
        tracing::info!(joined, lingering, "threads joined");
        joined
    }
}

impl<R: Resolve + 'static> Drop for PoolRunner<R> {
    fn drop(&mut self) {
        if panic::catch_unwind(AssertUnwindSafe(|| self.teardown())).is_err() {
            tracing::error!("pool runner teardown failed");
        }
    }
}

impl<R: Resolve + 'static> std::fmt::Debug for PoolRunner<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolRunner")
            .field("workers", &self.worker_count())
            .field("keep_alive", &self.work.is_some())
            .field("command", &self.command)
            .finish()
    }
}
