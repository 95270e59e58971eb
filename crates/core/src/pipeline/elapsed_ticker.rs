use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Sender};

/// Receives elapsed-time samples. Called from the ticker thread while a run is
/// active and once more by the engine with the final total.
pub trait ElapsedObserver: Send + Sync {
    fn on_elapsed(&self, elapsed: Duration);
}

impl<F> ElapsedObserver for F
where
    F: Fn(Duration) + Send + Sync,
{
    fn on_elapsed(&self, elapsed: Duration) {
        self(elapsed)
    }
}

/// Forwards samples into the channel. Samples are dropped once the receiver
/// is gone.
impl ElapsedObserver for Sender<Duration> {
    fn on_elapsed(&self, elapsed: Duration) {
        let _ = self.send(elapsed);
    }
}

/// Background stopwatch that reports time since `started` at a fixed interval.
///
/// Stops when [`ElapsedTicker::stop`] is called or the ticker is dropped.
pub struct ElapsedTicker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ElapsedTicker {
    pub fn start(started: Instant, interval: Duration, observer: Arc<dyn ElapsedObserver>) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let handle = std::thread::spawn(move || {
            let ticks = crossbeam_channel::tick(interval);
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticks) -> _ => observer.on_elapsed(started.elapsed()),
                }
            }
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stops the ticker and waits until no further events can be emitted.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Elapsed-time observer panicked");
            }
        }
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
