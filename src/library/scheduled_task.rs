use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// A callback fired on a worker thread every `period` until cancelled.
///
/// The first tick happens one full period after `spawn`. Cancelling wakes the
/// worker right away instead of letting it sleep out the current period, and
/// a tick that races with `cancel` is never delivered.
pub struct ScheduledTask {
    cancelled: Arc<AtomicBool>,
    stop_sender: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (stop_sender, stop_receiver) = mpsc::channel::<()>();
        let worker_cancelled = cancelled.clone();

        let handle = std::thread::spawn(move || loop {
            match stop_receiver.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => {
                    if worker_cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    if on_tick().is_break() {
                        worker_cancelled.store(true, Ordering::SeqCst);
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Self {
            cancelled,
            stop_sender: Some(stop_sender),
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(stop_sender) = self.stop_sender.take() {
            let _ = stop_sender.send(());
        }
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for ScheduledTask {
    /// Cancels and waits for the worker, which is already awake.
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
