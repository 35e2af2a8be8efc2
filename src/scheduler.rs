//! Periodic and manual refresh driving.
//!
//! One background thread owns the timer. Manual triggers wake it immediately
//! without resetting the periodic phase. A single in-flight gate drops any
//! trigger (scheduled or manual) that arrives while a refresh is running;
//! the in-flight result satisfies both.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc::{Receiver, RecvTimeoutError, Sender, channel},
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

enum Wakeup {
    Trigger,
    Shutdown,
}

/// Cancellation handle for the background refresh loop.
///
/// Dropping the scheduler cancels it; cancellation waits for an in-flight
/// run to finish, so no callback fires after `cancel` returns.
pub struct RefreshScheduler {
    wakeup_tx: Sender<Wakeup>,
    in_flight: Arc<AtomicBool>,
    manual_requested: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawn the refresh loop, invoking `task` every `interval` and on each
    /// accepted manual trigger.
    pub fn start<F>(interval: Duration, task: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (wakeup_tx, wakeup_rx) = channel::<Wakeup>();
        let in_flight = Arc::new(AtomicBool::new(false));
        let manual_requested = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            wakeup_rx,
            in_flight: in_flight.clone(),
            manual_requested: manual_requested.clone(),
            interval,
            task,
        };
        let handle = thread::spawn(move || worker.run());

        Self {
            wakeup_tx,
            in_flight,
            manual_requested,
            handle: Some(handle),
        }
    }

    /// Request an immediate refresh. Dropped when one is already in flight;
    /// the periodic phase is unaffected either way.
    pub fn trigger(&self) {
        if self.in_flight.load(Ordering::SeqCst) {
            return;
        }
        self.manual_requested.store(true, Ordering::SeqCst);
        let _ = self.wakeup_tx.send(Wakeup::Trigger);
    }

    /// Whether a refresh is currently running.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stop the timer and wait for the loop to exit. An in-flight run is
    /// allowed to complete first.
    pub fn cancel(&mut self) {
        let _ = self.wakeup_tx.send(Wakeup::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct Worker<F> {
    wakeup_rx: Receiver<Wakeup>,
    in_flight: Arc<AtomicBool>,
    manual_requested: Arc<AtomicBool>,
    interval: Duration,
    task: F,
}

impl<F: FnMut()> Worker<F> {
    fn run(mut self) {
        let mut deadline = Instant::now() + self.interval;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            match self.wakeup_rx.recv_timeout(timeout) {
                Ok(Wakeup::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                // A wakeup whose request was already satisfied by a run that
                // completed in the meantime is a no-op.
                Ok(Wakeup::Trigger) => {
                    if self.manual_requested.swap(false, Ordering::SeqCst) {
                        self.run_once();
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.run_once();
                    deadline += self.interval;
                }
            }
        }
    }

    fn run_once(&mut self) {
        self.in_flight.store(true, Ordering::SeqCst);
        (self.task)();
        // Triggers that arrived mid-run are satisfied by the result that
        // just landed.
        self.manual_requested.store(false, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);
    }
}
