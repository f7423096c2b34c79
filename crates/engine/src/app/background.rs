use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

const THREAD_NAME: &str = "background-update";

/// One beat of the background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundTick {
    pub sequence: u64,
    /// Time since the worker started.
    pub elapsed: Duration,
}

/// Thread that emits [`BackgroundTick`]s while the game runs.
///
/// The worker only produces ticks. Whoever drains them applies the work on
/// its own thread, so world, map and texture state never cross threads.
#[derive(Debug)]
pub struct BackgroundWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    ticks: Receiver<BackgroundTick>,
}

impl BackgroundWorker {
    pub fn spawn(interval: Duration) -> Result<Self, io::Error> {
        let running = Arc::new(AtomicBool::new(true));
        let (sender, ticks) = mpsc::channel();
        let thread_running = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_worker(thread_running, sender, interval))?;
        info!(interval_ms = interval.as_millis() as u64, "background_worker_started");
        Ok(Self {
            running,
            handle: Some(handle),
            ticks,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ticks received since the last drain, oldest first.
    pub fn drain(&self) -> impl Iterator<Item = BackgroundTick> + '_ {
        self.ticks.try_iter()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<BackgroundTick> {
        self.ticks.recv_timeout(timeout).ok()
    }

    /// Stops the thread and waits for it. A panic inside the worker is
    /// reported as a warning.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return;
        };
        match handle.join() {
            Ok(()) => info!("background_worker_stopped"),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|message| (*message).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(panic = message.as_str(), "background_worker_exited_abnormally");
            }
        }
    }
}

impl Drop for BackgroundWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(running: Arc<AtomicBool>, sender: Sender<BackgroundTick>, interval: Duration) {
    let started = Instant::now();
    let interval = interval.max(Duration::from_millis(1));
    let mut sequence = 0u64;
    while running.load(Ordering::Acquire) {
        thread::sleep(interval);
        sequence = sequence.wrapping_add(1);
        let tick = BackgroundTick {
            sequence,
            elapsed: started.elapsed(),
        };
        if sender.send(tick).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_ticks_in_order_until_shutdown() {
        let mut worker = BackgroundWorker::spawn(Duration::from_millis(1)).expect("spawn");
        let first = worker
            .recv_timeout(Duration::from_secs(5))
            .expect("first tick");
        let second = worker
            .recv_timeout(Duration::from_secs(5))
            .expect("second tick");
        assert!(second.sequence > first.sequence);
        assert!(second.elapsed >= first.elapsed);

        worker.shutdown();
        assert!(!worker.is_running());
        let _ = worker.drain().count();
        assert!(worker.recv_timeout(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn shutdown_twice_is_harmless() {
        let mut worker = BackgroundWorker::spawn(Duration::from_millis(5)).expect("spawn");
        worker.shutdown();
        worker.shutdown();
    }
}
