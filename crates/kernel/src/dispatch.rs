//! Hand-off of closures to one privileged thread.
//!
//! Windowing and graphics back-ends usually insist on being driven from the
//! thread that created them. `MainThread` owns a queue that only that thread
//! drains; any other thread can push work through a [`MainThreadHandle`] and
//! block until it has run.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use crate::error::{KernelError, KernelResult};

type Job = Box<dyn FnOnce() + Send>;

/// Dispatcher settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchConfig {
    /// How long a blocked caller waits between "still waiting" warnings.
    pub watchdog: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            watchdog: Duration::from_secs(10),
        }
    }
}

/// Receiving end, owned by the privileged thread.
pub struct MainThread {
    receiver: Receiver<Job>,
    sender: Sender<Job>,
    thread: ThreadId,
    config: DispatchConfig,
}

impl MainThread {
    /// Bind a dispatcher to the calling thread.
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    pub fn with_config(config: DispatchConfig) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            receiver,
            sender,
            thread: thread::current().id(),
            config,
        }
    }

    pub fn handle(&self) -> MainThreadHandle {
        MainThreadHandle {
            sender: self.sender.clone(),
            thread: self.thread,
            watchdog: self.config.watchdog,
        }
    }

    /// Run everything queued so far without blocking. Returns how many jobs ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Run jobs until every handle has been dropped. Returns how many jobs ran.
    pub fn run_until_closed(self) -> usize {
        let Self { receiver, sender, .. } = self;
        drop(sender);
        let mut ran = 0;
        for job in receiver {
            job();
            ran += 1;
        }
        tracing::debug!(jobs = ran, "main thread dispatcher closed");
        ran
    }
}

impl Default for MainThread {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sending end.
#[derive(Clone)]
pub struct MainThreadHandle {
    sender: Sender<Job>,
    thread: ThreadId,
    watchdog: Duration,
}

impl MainThreadHandle {
    /// Run `f` on the main thread and wait for its result.
    ///
    /// Called from the main thread itself, `f` runs inline. A call that takes
    /// longer than the watchdog interval is logged, once per interval, but is
    /// never cancelled.
    pub fn run<R: Send + 'static>(&self, f: impl FnOnce() -> R + Send + 'static) -> KernelResult<R> {
        if thread::current().id() == self.thread {
            return Ok(f());
        }

        let (done, result) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || {
            // The caller is blocked on `result`; a failed send means it already gave up.
            let _ = done.send(f());
        });
        self.sender.send(job).map_err(|_| KernelError::DispatchClosed)?;

        let started = Instant::now();
        loop {
            match result.recv_timeout(self.watchdog) {
                Ok(value) => return Ok(value),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        waited_ms = started.elapsed().as_millis() as u64,
                        "main thread call has not completed"
                    );
                }
                Err(RecvTimeoutError::Disconnected) => return Err(KernelError::DispatchAborted),
            }
        }
    }

    /// True when called from the dispatcher's own thread.
    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.thread
    }
}
