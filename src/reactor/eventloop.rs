use super::work::{Work, WorkCount};
use crate::base::neterror::NetError;
use std::{
    any::Any,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::runtime::{Builder, Handle, Runtime};

/// The shared event loop.
///
/// A multi-threaded tokio runtime with a fixed number of named worker
/// threads. Every worker pulls ready tasks from the same scheduler, so a
/// completion is delivered on whichever worker is idle, and two completions
/// can run at the same time on different workers.
///
/// The loop runs until it is out of work (see [`Work`]); [`EventLoop::run`]
/// blocks the caller until then. A stopped loop cannot be restarted.
pub struct EventLoop {
    runtime: Runtime,
    handle: LoopHandle,
    workers: usize,
    live: Arc<AtomicUsize>,
}

impl EventLoop {
    /// Creates a loop driven by `workers` threads named `<thread_name>-<i>`.
    ///
    /// The workers start immediately.
    pub fn new(workers: usize, thread_name: &str) -> Result<Self, NetError> {
        let workers = workers.max(1);
        let live = Arc::new(AtomicUsize::new(0));
        let next = AtomicUsize::new(0);
        let prefix = thread_name.to_string();

        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name_fn(move || format!("{}-{}", prefix, next.fetch_add(1, Ordering::Relaxed)))
            .on_thread_start({
                let live = live.clone();
                move || {
                    live.fetch_add(1, Ordering::AcqRel);
                }
            })
            .on_thread_stop({
                let live = live.clone();
                move || {
                    live.fetch_sub(1, Ordering::AcqRel);
                }
            })
            .enable_all()
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build event loop runtime");
                NetError::Unexpected
            })?;

        let handle = LoopHandle {
            runtime: runtime.handle().clone(),
            work: Arc::new(WorkCount::default()),
        };

        Ok(Self {
            runtime,
            handle,
            workers,
            live,
        })
    }

    /// Returns a handle for scheduling work on this loop.
    pub fn handle(&self) -> &LoopHandle {
        &self.handle
    }

    /// Number of worker threads driving the loop.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runtime threads currently alive, workers and blocking-pool threads
    /// alike.
    pub fn live_threads(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Blocks the calling thread until the loop runs out of work.
    ///
    /// Must not be called from inside an async context.
    pub fn run(&self) {
        self.runtime.block_on(self.handle.work.stopped());
    }

    /// Stops every runtime thread, giving blocking-pool threads (e.g. a
    /// `getaddrinfo` call that was abandoned) at most `grace` to finish.
    ///
    /// Returns the number of threads still running when the grace period
    /// ran out.
    pub fn shutdown(self, grace: Duration) -> usize {
        let live = self.live.clone();
        self.runtime.shutdown_timeout(grace);

        let lingering = live.load(Ordering::Acquire);
        if lingering > 0 {
            tracing::warn!(lingering, ?grace, "threads still running after shutdown grace");
        } else {
            tracing::debug!("event loop runtime shut down");
        }
        lingering
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("workers", &self.workers)
            .field("outstanding", &self.handle.outstanding())
            .field("stopped", &self.handle.is_stopped())
            .finish()
    }
}

/// Cheap, clonable handle used to schedule operations on an event loop.
///
/// Holds no reference to the loop's owner, so operations scheduled through
/// it never keep the pool alive on their own; they only keep the loop
/// running until they finish.
#[derive(Clone, Debug)]
pub struct LoopHandle {
    runtime: Handle,
    work: Arc<WorkCount>,
}

impl LoopHandle {
    /// Wraps the runtime of the current async context.
    ///
    /// The returned handle has its own work accounting, starting with no
    /// outstanding work. Panics if called outside a tokio runtime.
    pub fn current() -> Self {
        Self {
            runtime: Handle::current(),
            work: Arc::new(WorkCount::default()),
        }
    }

    /// Acquires a keep-alive guard.
    pub fn work(&self) -> Result<Work, NetError> {
        self.work.acquire()
    }

    /// Schedules `fut`, holding the loop open until it completes.
    pub fn spawn<F>(&self, fut: F) -> Result<(), NetError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let work = self.work()?;
        self.spawn_with(work, fut);
        Ok(())
    }

    /// Schedules `fut` under an already acquired guard.
    ///
    /// The guard is released when the future completes. A panic inside it
    /// is caught, logged, and releases the guard all the same.
    pub fn spawn_with<F>(&self, work: Work, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = self.runtime.spawn(fut);
        self.runtime.spawn(async move {
            let _work = work;
            if let Err(e) = task.await {
                if e.is_panic() {
                    let payload = e.into_panic();
                    tracing::error!(panic = %panic_message(payload.as_ref()), "run failed");
                }
            }
        });
    }

    /// Number of live keep-alive guards and in-flight operations.
    pub fn outstanding(&self) -> usize {
        self.work.outstanding()
    }

    /// True once the loop ran out of work. Nothing can be scheduled after.
    pub fn is_stopped(&self) -> bool {
        self.work.is_stopped()
    }

    /// Completes once the loop has run out of work.
    pub async fn stopped(&self) {
        self.work.stopped().await
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
